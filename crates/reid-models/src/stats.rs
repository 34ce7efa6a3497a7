//! Engine statistics and health reports.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Size of the identity cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct EngineStats {
    /// Live identities, including non-person placeholders
    pub tracked_count: usize,
    /// Approximate embedding memory in bytes
    pub approx_cache_bytes: usize,
}

/// Readiness report for health endpoints and self-checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct EngineHealth {
    pub model_loaded: bool,
    pub tracked_count: usize,
}
