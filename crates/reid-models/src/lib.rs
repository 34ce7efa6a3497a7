//! Shared data models for the re-identification service.
//!
//! This crate provides Serde-serializable types for:
//! - Identity ids and identity summaries
//! - Detection classes and the embedding-capable subset
//! - Per-detection match results (tagged new/existing)
//! - Batch request/response envelopes
//! - Engine stats and health reports
//! - Validation errors for incoming batches

pub mod detection;
pub mod error;
pub mod identity;
pub mod outcome;
pub mod stats;

// Re-export common types
pub use detection::{DetectionClass, DetectionItem, DetectionRequest};
pub use error::{ModelError, ModelResult};
pub use identity::{IdentityId, IdentitySummary};
pub use outcome::{BatchResponse, DetectionOutcome, MatchResult};
pub use stats::{EngineHealth, EngineStats};
