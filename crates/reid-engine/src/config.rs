//! Configuration for the identity tracking engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReidError, ReidResult};

/// Default tracking window (60 seconds).
pub const DEFAULT_TRACKING_WINDOW_MS: u64 = 60_000;

/// Default minimum cosine similarity to accept a match.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.6;

/// Allowed deviation of an embedding's L2 norm from 1.0 before warning.
pub const DEFAULT_NORM_TOLERANCE: f32 = 0.01;

/// File name of the OSNet AIN re-identification model.
pub const MODEL_FILE_NAME: &str = "osnet_ain_multisource.onnx";

/// Locations searched when no model path is configured.
const MODEL_CANDIDATES: &[&str] = &[
    "./models/osnet_ain_multisource.onnx",
    "/app/models/osnet_ain_multisource.onnx",
];

/// Configuration for the identity tracking engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Identities unseen for longer than this are evicted (default: 60000)
    pub tracking_window_ms: u64,

    /// Minimum cosine similarity to treat a sighting as a known identity (default: 0.6)
    pub similarity_threshold: f32,

    /// Log every match decision at info level (default: false)
    pub debug_mode: bool,

    /// Explicit ONNX model path; searched in standard locations when unset
    pub model_path: Option<PathBuf>,

    /// Norm deviation that triggers a warning (default: 0.01)
    pub norm_tolerance: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tracking_window_ms: DEFAULT_TRACKING_WINDOW_MS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            debug_mode: false,
            model_path: None,
            norm_tolerance: DEFAULT_NORM_TOLERANCE,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    ///
    /// Absent or unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        Self {
            tracking_window_ms: std::env::var("REID_TRACKING_WINDOW_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TRACKING_WINDOW_MS),
            similarity_threshold: std::env::var("REID_SIMILARITY_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD),
            debug_mode: std::env::var("REID_DEBUG")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            model_path: std::env::var("REID_MODEL_PATH").ok().map(PathBuf::from),
            norm_tolerance: std::env::var("REID_NORM_TOLERANCE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_NORM_TOLERANCE),
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> ReidResult<()> {
        validate_tracking_window(self.tracking_window_ms)?;
        validate_similarity_threshold(self.similarity_threshold)?;
        if self.norm_tolerance.is_nan() || self.norm_tolerance < 0.0 {
            return Err(ReidError::invalid_config(format!(
                "norm_tolerance must be non-negative, got {}",
                self.norm_tolerance
            )));
        }
        Ok(())
    }

    /// Resolve the model file: the explicit path, else the first existing candidate.
    pub fn resolve_model_path(&self) -> ReidResult<PathBuf> {
        if let Some(path) = &self.model_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(ReidError::model_not_found(path.display().to_string()));
        }

        MODEL_CANDIDATES
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                ReidError::model_not_found(format!(
                    "{} not found; set REID_MODEL_PATH or place it under ./models/",
                    MODEL_FILE_NAME
                ))
            })
    }
}

pub(crate) fn validate_tracking_window(ms: u64) -> ReidResult<()> {
    if ms == 0 {
        return Err(ReidError::invalid_config(
            "tracking_window_ms must be greater than zero",
        ));
    }
    Ok(())
}

pub(crate) fn validate_similarity_threshold(threshold: f32) -> ReidResult<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ReidError::invalid_config(format!(
            "similarity_threshold must be within [0, 1], got {}",
            threshold
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.tracking_window_ms, 60_000);
        assert!((config.similarity_threshold - 0.6).abs() < f32::EPSILON);
        assert!(!config.debug_mode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config = EngineConfig {
            tracking_window_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ReidError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        for threshold in [-0.1, 1.5, f32::NAN] {
            let config = EngineConfig {
                similarity_threshold: threshold,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "threshold {threshold} accepted");
        }
    }

    #[test]
    fn test_explicit_model_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MODEL_FILE_NAME);
        std::fs::write(&path, b"onnx").unwrap();

        let config = EngineConfig {
            model_path: Some(path.clone()),
            ..Default::default()
        };
        assert_eq!(config.resolve_model_path().unwrap(), path);
    }

    #[test]
    fn test_missing_explicit_model_path() {
        let config = EngineConfig {
            model_path: Some(PathBuf::from("/nonexistent/osnet.onnx")),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve_model_path(),
            Err(ReidError::ModelNotFound(_))
        ));
    }
}
