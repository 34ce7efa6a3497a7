//! Service configuration.

use std::str::FromStr;

use reid_engine::EngineConfig;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable, colored
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ServiceError::config_error(format!("Unknown log format: {other}"))),
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub engine: EngineConfig,
    pub log_format: LogFormat,
}

impl ServiceConfig {
    /// Create config from environment variables, loading `.env` first.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            engine: EngineConfig::from_env(),
            log_format: std::env::var("LOG_FORMAT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }
}
