use std::sync::Arc;

use crate::config::Config;
use crate::db::Db;
use crate::error::{StoreError, StoreResult};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<Db>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let db = Db::open(&config.database_path)?;
        if config.seed_demo_data && db.seed_demo_data()? {
            tracing::info!("Demo data loaded into {}", config.database_path.display());
        }
        Self::with_db(config, db)
    }

    /// Build state around an already-open store (tests use an in-memory one).
    pub fn with_db(config: Config, db: Db) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(
                config.llm.timeout_secs.clamp(1, 60),
            ))
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            http_client,
        })
    }

    /// Run a store operation on the blocking pool.
    pub async fn db_call<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Db) -> StoreResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(StoreError::from)?
    }
}
