//! Per-detection results returned to callers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{DetectionClass, IdentityId, IdentitySummary};

/// Result of re-identifying one detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchResult {
    /// No live identity matched; a new one was created.
    New {
        identity_id: IdentityId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        first_detection: Option<IdentitySummary>,
    },
    /// An existing identity matched this sighting.
    Existing {
        identity_id: IdentityId,
        /// Cosine similarity of the accepted match (absent for bucket hits)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        similarity: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        first_detection: Option<IdentitySummary>,
    },
}

impl MatchResult {
    pub fn is_new(&self) -> bool {
        matches!(self, MatchResult::New { .. })
    }

    pub fn identity_id(&self) -> &IdentityId {
        match self {
            MatchResult::New { identity_id, .. } | MatchResult::Existing { identity_id, .. } => {
                identity_id
            }
        }
    }

    pub fn first_detection(&self) -> Option<&IdentitySummary> {
        match self {
            MatchResult::New {
                first_detection, ..
            }
            | MatchResult::Existing {
                first_detection, ..
            } => first_detection.as_ref(),
        }
    }

    /// Label used for logs and metrics.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            MatchResult::New { .. } => "new",
            MatchResult::Existing { .. } => "existing",
        }
    }
}

/// Outcome for one item of a batch.
///
/// A failed item is reported in place instead of aborting the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DetectionOutcome {
    Matched {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detection_id: Option<String>,
        class_name: DetectionClass,
        score: f32,
        result: MatchResult,
    },
    Failed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detection_id: Option<String>,
        class_name: DetectionClass,
        /// Stable error label (decode, inference, not_initialized, ...)
        error_kind: String,
        message: String,
    },
}

impl DetectionOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, DetectionOutcome::Failed { .. })
    }

    pub fn match_result(&self) -> Option<&MatchResult> {
        match self {
            DetectionOutcome::Matched { result, .. } => Some(result),
            DetectionOutcome::Failed { .. } => None,
        }
    }
}

/// Response for a batch of detections from one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BatchResponse {
    pub timestamp: i64,
    pub device_id: String,
    pub device_name: String,
    pub detections: Vec<DetectionOutcome>,
    pub detection_count: usize,
    /// True when at least one person/face item was re-identified
    pub has_persons: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_result_tagging() {
        let result = MatchResult::Existing {
            identity_id: "person_1_x".into(),
            similarity: Some(0.8),
            first_detection: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "existing");
        assert_eq!(json["identity_id"], "person_1_x");
        assert!(json.get("first_detection").is_none());
        assert!(!result.is_new());
    }

    #[test]
    fn test_failed_outcome_has_no_result() {
        let outcome = DetectionOutcome::Failed {
            detection_id: Some("d1".to_string()),
            class_name: DetectionClass::Person,
            error_kind: "decode".to_string(),
            message: "bad image".to_string(),
        };
        assert!(outcome.is_failed());
        assert!(outcome.match_result().is_none());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["class_name"], "person");
    }
}
