use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Insert the demo dataset on startup when the store is empty
    pub seed_demo_data: bool,
    /// Text-generation provider used for recommendation explanations
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "huggingface", "azure", "openai" or "ollama"
    pub provider: String,
    /// Base URL for the provider API
    pub base_url: String,
    /// Model id (HuggingFace, OpenAI, Ollama) or deployment name (Azure)
    pub model: String,
    /// API key / token. Hosted providers are disabled without one.
    pub api_key: Option<String>,
    /// Azure OpenAI `api-version` query parameter
    pub api_version: String,
    /// Request timeout in seconds (capped at 60)
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            database_path: PathBuf::from("./app.db"),
            seed_demo_data: false,
            llm: LlmConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "huggingface".to_string(),
            base_url: "https://api-inference.huggingface.co".to_string(),
            model: "mistralai/Mistral-7B-Instruct-v0.3".to_string(),
            api_key: None,
            api_version: "2023-10-01".to_string(),
            timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    /// Whether an outbound generation call should be attempted at all.
    /// Ollama runs locally and needs no key; hosted providers do.
    pub fn is_enabled(&self) -> bool {
        if self.base_url.trim().is_empty() {
            return false;
        }
        match self.provider.as_str() {
            "ollama" => true,
            _ => self.api_key.as_deref().is_some_and(|k| !k.is_empty()),
        }
    }

    /// Default `(base_url, model)` for a provider. Azure has none: its
    /// endpoint and deployment are per-resource.
    fn provider_defaults(provider: &str) -> Option<(&'static str, &'static str)> {
        match provider {
            "huggingface" => Some((
                "https://api-inference.huggingface.co",
                "mistralai/Mistral-7B-Instruct-v0.3",
            )),
            "openai" => Some(("https://api.openai.com", "gpt-4o-mini")),
            "ollama" => Some(("http://localhost:11434", "llama3.2")),
            "azure" => Some(("", "")),
            _ => None,
        }
    }

    /// Switch provider, resetting `base_url` and `model` to that
    /// provider's defaults. Same provider or unknown name: only the name changes.
    fn switch_provider(&mut self, provider: String) {
        if provider != self.provider {
            if let Some((base_url, model)) = Self::provider_defaults(&provider) {
                self.base_url = base_url.to_string();
                self.model = model.to_string();
            }
        }
        self.provider = provider;
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup. `from_env` passes
    /// the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("TUTOR_MATCH_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(url) = lookup("TUTOR_MATCH_DATABASE").or_else(|| lookup("DATABASE_URL")) {
            config.database_path = parse_database_path(&url);
        }
        if let Some(val) = lookup("TUTOR_MATCH_SEED") {
            config.seed_demo_data = matches!(val.trim(), "1" | "true" | "yes");
        }

        // Provider-specific variables first, generic LLM_* override them
        if let Some(token) = lookup("HF_API_TOKEN") {
            config.llm.api_key = Some(token);
        }
        if let Some(model) = lookup("HF_MODEL_ID") {
            config.llm.model = model;
        }
        if let Some(endpoint) = lookup("AZURE_OPENAI_ENDPOINT") {
            config.llm.provider = "azure".to_string();
            config.llm.base_url = endpoint;
            if let Some(key) = lookup("AZURE_OPENAI_KEY") {
                config.llm.api_key = Some(key);
            }
            if let Some(deployment) = lookup("AZURE_OPENAI_DEPLOYMENT") {
                config.llm.model = deployment;
            }
        }
        if let Some(version) = lookup("AZURE_OPENAI_API_VERSION") {
            config.llm.api_version = version;
        }

        if let Some(provider) = lookup("LLM_PROVIDER") {
            config.llm.switch_provider(provider.trim().to_ascii_lowercase());
        }
        if let Some(url) = lookup("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            config.llm.model = model;
        }
        if let Some(key) = lookup("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Some(val) = lookup("LLM_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.llm.timeout_secs = v.min(60);
            }
        }

        config
    }
}

/// Accepts either a bare path or a `sqlite:///` style URL
/// (`sqlite:///app.db` is relative, `sqlite:////tmp/app.db` absolute).
fn parse_database_path(url: &str) -> PathBuf {
    let trimmed = url
        .strip_prefix("sqlite:///")
        .or_else(|| url.strip_prefix("sqlite://"))
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    PathBuf::from(trimmed)
}
