//! Detection classes and the batch request envelope.
//!
//! Only `person` and `face` detections carry appearance embeddings; every
//! other class goes through coarse time-bucket deduplication.

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, ModelResult};

/// Object class reported by the upstream detector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DetectionClass {
    Person,
    Face,
    /// Any other class (vehicle, animal, package, ...), lowercased.
    Other(String),
}

impl DetectionClass {
    /// Returns the class label as a string.
    pub fn as_str(&self) -> &str {
        match self {
            DetectionClass::Person => "person",
            DetectionClass::Face => "face",
            DetectionClass::Other(label) => label.as_str(),
        }
    }

    /// Returns true if this class is re-identified by appearance embedding.
    pub fn supports_embedding(&self) -> bool {
        matches!(self, DetectionClass::Person | DetectionClass::Face)
    }
}

impl fmt::Display for DetectionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for DetectionClass {
    fn from(s: &str) -> Self {
        let label = s.trim().to_lowercase();
        match label.as_str() {
            "person" => DetectionClass::Person,
            "face" => DetectionClass::Face,
            _ => DetectionClass::Other(label),
        }
    }
}

impl From<String> for DetectionClass {
    fn from(s: String) -> Self {
        DetectionClass::from(s.as_str())
    }
}

impl From<DetectionClass> for String {
    fn from(class: DetectionClass) -> Self {
        class.as_str().to_string()
    }
}

impl JsonSchema for DetectionClass {
    fn schema_name() -> String {
        "DetectionClass".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

/// A single cropped detection submitted for re-identification.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DetectionItem {
    /// Upstream detection id, echoed back in the outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_id: Option<String>,

    pub class_name: DetectionClass,

    /// Detector confidence
    #[serde(default)]
    pub score: f32,

    /// Cropped image bytes (base64 on the wire)
    #[serde(with = "base64_bytes")]
    #[schemars(with = "String")]
    pub image: Vec<u8>,
}

impl DetectionItem {
    /// Check the item can be routed.
    ///
    /// Embedding classes need image bytes; other classes are deduplicated
    /// without looking at the image.
    pub fn validate(&self) -> ModelResult<()> {
        if self.class_name.as_str().is_empty() {
            return Err(ModelError::EmptyClass);
        }
        if self.class_name.supports_embedding() && self.image.is_empty() {
            return Err(ModelError::MissingImage(self.class_name.to_string()));
        }
        Ok(())
    }
}

/// A batch of detections from one camera frame.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DetectionRequest {
    /// Frame timestamp as reported by the camera host (ms)
    pub timestamp: i64,
    pub device_id: String,
    pub device_name: String,
    pub detections: Vec<DetectionItem>,
}

impl DetectionRequest {
    /// Check the frame envelope. Items are validated one by one.
    pub fn validate(&self) -> ModelResult<()> {
        if self.device_id.trim().is_empty() {
            return Err(ModelError::EmptyDeviceId);
        }
        Ok(())
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_parse() {
        assert_eq!(DetectionClass::from("person"), DetectionClass::Person);
        assert_eq!(DetectionClass::from(" Face "), DetectionClass::Face);
        assert_eq!(
            DetectionClass::from("Vehicle"),
            DetectionClass::Other("vehicle".to_string())
        );
    }

    #[test]
    fn test_embedding_support() {
        assert!(DetectionClass::Person.supports_embedding());
        assert!(DetectionClass::Face.supports_embedding());
        assert!(!DetectionClass::from("animal").supports_embedding());
    }

    #[test]
    fn test_request_deserializes_base64_image() {
        let json = r#"{
            "timestamp": 1700000000000,
            "device_id": "cam-1",
            "device_name": "Driveway",
            "detections": [
                {"class_name": "person", "score": 0.9, "image": "AQID"}
            ]
        }"#;
        let request: DetectionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.detections.len(), 1);
        assert_eq!(request.detections[0].class_name, DetectionClass::Person);
        assert_eq!(request.detections[0].image, vec![1, 2, 3]);
        assert!(request.detections[0].detection_id.is_none());
    }

    fn item(class: &str, image: Vec<u8>) -> DetectionItem {
        DetectionItem {
            detection_id: None,
            class_name: class.into(),
            score: 0.5,
            image,
        }
    }

    #[test]
    fn test_item_validation() {
        assert!(item("person", vec![1]).validate().is_ok());
        assert!(item("vehicle", Vec::new()).validate().is_ok());
        assert_eq!(
            item("face", Vec::new()).validate(),
            Err(ModelError::MissingImage("face".to_string()))
        );
        assert_eq!(item("  ", vec![1]).validate(), Err(ModelError::EmptyClass));
    }

    #[test]
    fn test_request_requires_device_id() {
        let request = DetectionRequest {
            timestamp: 0,
            device_id: " ".to_string(),
            device_name: "Porch".to_string(),
            detections: vec![],
        };
        let err = request.validate().unwrap_err();
        assert_eq!(err, ModelError::EmptyDeviceId);
        assert_eq!(err.kind(), "invalid_request");
    }

    #[test]
    fn test_class_serializes_as_label() {
        let json = serde_json::to_string(&DetectionClass::from("dog")).unwrap();
        assert_eq!(json, "\"dog\"");
    }
}
