//! Error types for identity tracking.

use thiserror::Error;

/// Result type for engine operations.
pub type ReidResult<T> = Result<T, ReidError>;

/// Errors that can occur while re-identifying a detection.
///
/// Every variant is scoped to the single detection being processed; none of
/// them leave the identity store in a partially updated state.
#[derive(Debug, Error)]
pub enum ReidError {
    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Re-identification engine not initialized")]
    NotInitialized,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReidError {
    /// Create a decode failure error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create an inference failure error.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create a model not found error.
    pub fn model_not_found(path: impl Into<String>) -> Self {
        Self::ModelNotFound(path.into())
    }

    /// Create a model load failure error.
    pub fn model_load(message: impl Into<String>) -> Self {
        Self::ModelLoad(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable label for per-detection error markers and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ReidError::Decode(_) => "decode",
            ReidError::Inference(_) => "inference",
            ReidError::NotInitialized => "not_initialized",
            ReidError::InvalidConfig(_) => "invalid_config",
            ReidError::ModelNotFound(_) => "model_not_found",
            ReidError::ModelLoad(_) => "model_load",
            ReidError::Internal(_) => "internal",
        }
    }

    /// Whether the caller may retry the same detection later.
    ///
    /// Only a not-yet-initialized engine is transient; the core itself
    /// never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReidError::NotInitialized)
    }
}
