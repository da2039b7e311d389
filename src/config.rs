//! Application configuration loaded from environment variables.
//!
//! The Apify token and webhook endpoint are optional: without them the
//! catalog falls back to cached/local/sample data and the analytics sink
//! stays disabled.

use std::env;
use std::path::PathBuf;

/// Hours a cached catalog snapshot stays fresh.
pub const CACHE_MAX_AGE_HOURS: i64 = 24;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Apify API token (bearer auth). None disables the remote source.
    pub apify_api_token: Option<String>,
    /// Specific Apify run ID to read the dataset from.
    pub apify_run_id: Option<String>,
    /// Apify actor ID; used for "latest successful run" when no run ID.
    pub apify_actor_id: Option<String>,
    /// Apify API base URL.
    pub apify_base_url: String,
    /// Analytics webhook endpoint. None disables delivery.
    pub webhook_endpoint: Option<String>,
    /// Path of the on-disk key-value store. None keeps state in memory.
    pub storage_path: Option<PathBuf>,
    /// Bundled static fallback dataset.
    pub local_dataset_path: PathBuf,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            apify_api_token: None,
            apify_run_id: None,
            apify_actor_id: None,
            apify_base_url: "https://api.apify.com/v2".to_string(),
            webhook_endpoint: None,
            storage_path: None,
            local_dataset_path: PathBuf::from("data/events_fallback.json"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            apify_api_token: env::var("APIFY_API_TOKEN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            apify_run_id: env::var("APIFY_RUN_ID").ok().filter(|v| !v.is_empty()),
            apify_actor_id: env::var("APIFY_ACTOR_ID")
                .ok()
                .filter(|v| !v.is_empty())
                .or_else(|| Some("lexis-solutions/lu-ma-scraper".to_string())),
            apify_base_url: env::var("APIFY_BASE_URL")
                .unwrap_or_else(|_| "https://api.apify.com/v2".to_string()),
            webhook_endpoint: env::var("ANALYTICS_WEBHOOK_URL")
                .ok()
                .filter(|v| !v.is_empty()),
            storage_path: env::var("EVENT_MATCHER_STORAGE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            local_dataset_path: env::var("EVENT_MATCHER_DATASET")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/events_fallback.json")),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("APIFY_API_TOKEN", "test_token");
        env::set_var("APIFY_RUN_ID", "run_123");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.apify_api_token.as_deref(), Some("test_token"));
        assert_eq!(config.apify_run_id.as_deref(), Some("run_123"));
        assert_eq!(config.apify_base_url, "https://api.apify.com/v2");
    }

    #[test]
    fn test_default_config_has_no_remote() {
        let config = Config::default();
        assert!(config.apify_api_token.is_none());
        assert!(config.webhook_endpoint.is_none());
        assert!(config.storage_path.is_none());
    }
}
