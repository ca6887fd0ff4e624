//! Configuration for the allocation engine

use serde::{Deserialize, Serialize};

/// Allocation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum commit attempts per request (first try included)
    pub max_attempts: u32,

    /// Base backoff between attempts (milliseconds), scaled by attempt
    pub retry_backoff_ms: u64,

    /// Random jitter added on top of the backoff (milliseconds)
    pub retry_jitter_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff_ms: 25,
            retry_jitter_ms: 25,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(attempts) = std::env::var("ALLOCATION_MAX_ATTEMPTS") {
            config.max_attempts = attempts
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid max attempts: {}", e)))?;
        }

        Ok(config)
    }
}
