use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use tutor_match::api;
use tutor_match::config::Config;
use tutor_match::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Database: {}", config.database_path.display());
    if config.llm.is_enabled() {
        tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.model);
    } else {
        tracing::info!("LLM disabled, explanations use the template");
    }

    let state = AppState::new(config.clone())?;

    // The frontend runs on its own dev server, so any origin may call the API.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
