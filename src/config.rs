//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use secrecy::SecretString;

/// HTTP header name for API key authentication.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Development default values.
pub mod defaults {
    pub const DEV_API_URL: &str = "http://127.0.0.1:8000";
    pub const DEV_POLL_INTERVAL_MS: u64 = 3000;
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the pipeline API server
    pub api_url: String,
    /// API key from the environment, if set (overrides the stored credential)
    pub api_key: Option<SecretString>,
    /// Interval between job status polls
    pub poll_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `LOADCAST_API_URL`: Pipeline API base URL (default: http://127.0.0.1:8000)
    /// - `LOADCAST_API_KEY`: API key (optional; falls back to the stored credential)
    /// - `LOADCAST_POLL_INTERVAL_MS`: Status poll interval in milliseconds (default: 3000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = env::var("LOADCAST_API_URL")
            .unwrap_or_else(|_| defaults::DEV_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let api_key = env::var("LOADCAST_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(SecretString::from);

        let poll_interval_ms = match env::var("LOADCAST_POLL_INTERVAL_MS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue("LOADCAST_POLL_INTERVAL_MS must be a valid number")
            })?,
            Err(_) => defaults::DEV_POLL_INTERVAL_MS,
        };
        if poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "LOADCAST_POLL_INTERVAL_MS must be greater than zero",
            ));
        }

        Ok(Config {
            api_url,
            api_key,
            poll_interval: Duration::from_millis(poll_interval_ms),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),
}
