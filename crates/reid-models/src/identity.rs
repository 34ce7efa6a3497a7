//! Identity identifiers and caller-facing identity summaries.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::DetectionClass;

/// Unique identifier for a tracked identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct IdentityId(pub String);

impl IdentityId {
    /// Generate a fresh person id stamped with the creation time.
    ///
    /// The random suffix makes the id unique even for identities created
    /// within the same millisecond.
    pub fn new_person(now_ms: i64) -> Self {
        Self(format!("person_{}_{}", now_ms, Uuid::new_v4().simple()))
    }

    /// Deterministic key for a per-camera, per-class time bucket.
    pub fn for_bucket(class: &DetectionClass, camera_id: &str, bucket: i64) -> Self {
        Self(format!("{}_{}_{}", class, camera_id, bucket))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for IdentityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IdentityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Caller-facing view of a tracked identity.
///
/// Never carries the embedding or the snapshot bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IdentitySummary {
    pub identity_id: IdentityId,
    /// Creation time (ms since epoch)
    pub first_seen_ms: i64,
    /// Most recent sighting (ms since epoch)
    pub last_seen_ms: i64,
    /// Camera of the most recent sighting
    pub camera_id: String,
    pub camera_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_ids_are_unique() {
        let a = IdentityId::new_person(1_000);
        let b = IdentityId::new_person(1_000);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("person_1000_"));
    }

    #[test]
    fn test_bucket_key_format() {
        let id = IdentityId::for_bucket(&DetectionClass::from("vehicle"), "cam-1", 42);
        assert_eq!(id.as_str(), "vehicle_cam-1_42");
    }

    #[test]
    fn test_summary_serialization() {
        let summary = IdentitySummary {
            identity_id: "person_1_abc".into(),
            first_seen_ms: 1,
            last_seen_ms: 2,
            camera_id: "cam".to_string(),
            camera_name: "Front Door".to_string(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["identity_id"], "person_1_abc");
        assert_eq!(json["last_seen_ms"], 2);
    }
}
