//! Service error types.

use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Engine error: {0}")]
    Engine(#[from] reid_engine::ReidError),

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] reid_models::ModelError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ServiceError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
