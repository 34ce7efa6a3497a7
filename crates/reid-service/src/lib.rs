//! Hosting glue for the re-identification engine.
//!
//! Loads configuration from the environment, initialises tracing, builds
//! and initialises the engine, and runs frame batches with per-detection
//! error isolation.

pub mod batch;
pub mod config;
pub mod error;
pub mod logging;

pub use batch::BatchProcessor;
pub use config::{LogFormat, ServiceConfig};
pub use error::{ServiceError, ServiceResult};
pub use logging::init_tracing;

use std::sync::Arc;

use reid_engine::ReidEngine;
use tracing::info;

/// Build the engine from configuration and load its model.
pub async fn build_engine(config: &ServiceConfig) -> ServiceResult<Arc<ReidEngine>> {
    let engine = ReidEngine::new(config.engine.clone())?;
    engine.initialize().await?;
    info!(
        tracking_window_ms = config.engine.tracking_window_ms,
        similarity_threshold = config.engine.similarity_threshold,
        "Re-identification engine ready"
    );
    Ok(Arc::new(engine))
}
