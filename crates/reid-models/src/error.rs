//! Validation errors for incoming detection batches.

use thiserror::Error;

/// Result type for model validation.
pub type ModelResult<T> = Result<T, ModelError>;

/// A request or item that cannot be processed as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Device id must not be empty")]
    EmptyDeviceId,

    #[error("Detection class must not be empty")]
    EmptyClass,

    #[error("Detection of class {0} carries no image")]
    MissingImage(String),
}

impl ModelError {
    /// Stable label, shared with engine error kinds in batch outcomes.
    pub fn kind(&self) -> &'static str {
        "invalid_request"
    }
}
