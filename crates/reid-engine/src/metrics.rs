//! Engine metrics.
//!
//! Records through the `metrics` facade; installing an exporter is left to
//! the hosting process.

use metrics::{counter, gauge, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Detections processed by class and outcome (new, existing, error).
    pub const DETECTIONS_TOTAL: &str = "reid_detections_total";

    /// Identities removed by the eviction policy.
    pub const EVICTIONS_TOTAL: &str = "reid_evictions_total";

    /// Live identities in the store.
    pub const TRACKED_IDENTITIES: &str = "reid_tracked_identities";

    /// Model inference latency in seconds.
    pub const INFERENCE_DURATION_SECONDS: &str = "reid_inference_duration_seconds";
}

/// Record one processed detection.
pub fn record_detection(class: &str, outcome: &str) {
    counter!(
        names::DETECTIONS_TOTAL,
        "class" => class.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record evicted identities.
pub fn record_evictions(count: usize) {
    if count > 0 {
        counter!(names::EVICTIONS_TOTAL).increment(count as u64);
    }
}

/// Publish the current store size.
pub fn set_tracked_identities(count: usize) {
    gauge!(names::TRACKED_IDENTITIES).set(count as f64);
}

/// Record model inference latency.
pub fn record_inference(duration_secs: f64) {
    histogram!(names::INFERENCE_DURATION_SECONDS).record(duration_secs);
}
