#![deny(unreachable_patterns)]
//! Identity tracking engine for cross-camera re-identification.
//!
//! This crate provides:
//! - Appearance embedding extraction over a pluggable model (ONNX Runtime by default)
//! - An insertion-ordered, time-windowed identity store
//! - Cosine-similarity matching with a configurable threshold
//! - Opportunistic eviction of identities outside the tracking window
//! - Time-bucket deduplication for classes without embeddings

pub mod clock;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod eviction;
pub mod extractor;
pub mod matcher;
pub mod metrics;
pub mod model;
pub mod store;


pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use dedup::NonPersonDeduplicator;
pub use engine::ReidEngine;
pub use error::{ReidError, ReidResult};
pub use eviction::EvictionPolicy;
pub use extractor::{
    preprocess, Embedding, EmbeddingExtractor, EMBEDDING_DIM, INPUT_HEIGHT, INPUT_WIDTH,
};
pub use matcher::{cosine_similarity, BestMatch, Matcher};
pub use model::{EmbeddingModel, OrtEmbeddingModel};
pub use store::{IdentityStore, TrackedIdentity};
