use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use thiserror::Error;

use crate::core_types::{TopK, UserId};
use crate::models::Ad;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClientConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Placeholder data written when users/ads cannot be fetched
    #[serde(default)]
    pub fallback: FallbackConfig,
}

/// Remote recommendation service access
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Per-attempt timeout
    pub timeout_ms: u64,
    /// Total attempts, including the first
    pub retry_count: u32,
    /// Delay before attempt n+1 is `backoff_step_ms * n`
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,
}

fn default_backoff_step_ms() -> u64 {
    1000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: 10_000,
            retry_count: 3,
            backoff_step_ms: default_backoff_step_ms(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Backoff after the given failed attempt (1-based)
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_step_ms.saturating_mul(attempt as u64))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url is empty".into()));
        }
        if self.retry_count == 0 {
            return Err(ConfigError::Invalid(
                "api.retry_count must be at least 1".into(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("api.timeout_ms must be > 0".into()));
        }
        Ok(())
    }
}

/// Dashboard behaviour knobs
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DashboardConfig {
    /// Recommendations requested per fetch
    pub top_k: TopK,
    /// Pause before the refresh that follows a simulated interaction
    pub simulate_refresh_delay_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_k: 6,
            simulate_refresh_delay_ms: 500,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FallbackConfig {
    pub users: Vec<UserId>,
    pub ads: Vec<Ad>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            users: vec![
                "user_1".to_string(),
                "user_2".to_string(),
                "user_3".to_string(),
            ],
            ads: vec![
                Ad::new("ad_1", "Sample Ad 1", "electronics", Decimal::new(25, 1)),
                Ad::new("ad_2", "Sample Ad 2", "clothing", Decimal::new(18, 1)),
                Ad::new("ad_3", "Sample Ad 3", "travel", Decimal::new(32, 1)),
            ],
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "adpulse.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            api: ApiConfig::default(),
            dashboard: DashboardConfig::default(),
            fallback: FallbackConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load `config/{env}.yaml`
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        Self::from_file(&format!("config/{}.yaml", env))
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: ClientConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_string(),
                source,
            })?;
        config.api.validate()?;
        Ok(config)
    }
}
