//! Per-frame batch processing.
//!
//! A frame carries several cropped detections from one camera. Each is
//! re-identified in order; a failure is recorded on its own outcome and
//! never aborts the rest of the frame.

use std::sync::Arc;

use reid_engine::ReidEngine;
use reid_models::{BatchResponse, DetectionItem, DetectionOutcome, DetectionRequest};
use tracing::{info, info_span, Instrument};

use crate::error::ServiceResult;

/// Runs whole frames through the engine.
#[derive(Clone)]
pub struct BatchProcessor {
    engine: Arc<ReidEngine>,
}

impl BatchProcessor {
    pub fn new(engine: Arc<ReidEngine>) -> Self {
        Self { engine }
    }

    /// Process every detection of one frame.
    ///
    /// `detection_count` counts successfully re-identified detections.
    /// `has_persons` is set when any of them belongs to an embedding class.
    /// A malformed envelope is rejected whole; a malformed item fails alone.
    pub async fn process(&self, request: DetectionRequest) -> ServiceResult<BatchResponse> {
        request.validate()?;

        let span = info_span!(
            "frame",
            device_id = %request.device_id,
            detections = request.detections.len()
        );

        async move {
            let DetectionRequest {
                timestamp,
                device_id,
                device_name,
                detections,
            } = request;

            let mut outcomes = Vec::with_capacity(detections.len());
            for item in detections {
                outcomes.push(self.process_item(item, &device_id, &device_name).await);
            }

            let detection_count = outcomes.iter().filter(|o| !o.is_failed()).count();
            let has_persons = outcomes.iter().any(|o| match o {
                DetectionOutcome::Matched { class_name, .. } => class_name.supports_embedding(),
                DetectionOutcome::Failed { .. } => false,
            });

            info!(
                matched = detection_count,
                failed = outcomes.len() - detection_count,
                has_persons = has_persons,
                "Frame processed"
            );

            Ok(BatchResponse {
                timestamp,
                device_id,
                device_name,
                detections: outcomes,
                detection_count,
                has_persons,
            })
        }
        .instrument(span)
        .await
    }

    async fn process_item(
        &self,
        item: DetectionItem,
        device_id: &str,
        device_name: &str,
    ) -> DetectionOutcome {
        if let Err(e) = item.validate() {
            return DetectionOutcome::Failed {
                detection_id: item.detection_id,
                class_name: item.class_name,
                error_kind: e.kind().to_string(),
                message: e.to_string(),
            };
        }

        let DetectionItem {
            detection_id,
            class_name,
            score,
            image,
        } = item;

        match self
            .engine
            .process_detection(image, device_id, device_name, &class_name)
            .await
        {
            Ok(result) => DetectionOutcome::Matched {
                detection_id,
                class_name,
                score,
                result,
            },
            Err(e) => DetectionOutcome::Failed {
                detection_id,
                class_name,
                error_kind: e.kind().to_string(),
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
    use ndarray::Array4;
    use reid_engine::{EmbeddingModel, EngineConfig, ReidResult, EMBEDDING_DIM};
    use reid_models::DetectionClass;

    use super::*;
    use crate::error::ServiceError;

    struct AxisModel;

    impl EmbeddingModel for AxisModel {
        fn embed(&self, _input: Array4<f32>) -> ReidResult<Vec<f32>> {
            let mut v = vec![0.0; EMBEDDING_DIM];
            v[0] = 1.0;
            Ok(v)
        }

        fn name(&self) -> &str {
            "axis"
        }
    }

    fn png() -> Vec<u8> {
        let img = RgbImage::from_pixel(16, 32, Rgb([90, 90, 90]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    fn item(id: &str, class: &str, image: Vec<u8>) -> DetectionItem {
        DetectionItem {
            detection_id: Some(id.to_string()),
            class_name: DetectionClass::from(class),
            score: 0.9,
            image,
        }
    }

    fn request(detections: Vec<DetectionItem>) -> DetectionRequest {
        DetectionRequest {
            timestamp: 1_700_000_000_000,
            device_id: "cam-1".to_string(),
            device_name: "Porch".to_string(),
            detections,
        }
    }

    async fn processor() -> BatchProcessor {
        let engine = ReidEngine::new(EngineConfig::default()).unwrap();
        engine.initialize_with(Arc::new(AxisModel)).await;
        BatchProcessor::new(Arc::new(engine))
    }

    #[tokio::test]
    async fn test_failed_item_does_not_abort_frame() {
        let processor = processor().await;

        let response = processor
            .process(request(vec![
                item("d1", "person", b"not an image".to_vec()),
                item("d2", "person", png()),
                item("d3", "vehicle", Vec::new()),
            ]))
            .await
            .unwrap();

        assert_eq!(response.detections.len(), 3);
        assert_eq!(response.detection_count, 2);
        assert!(response.has_persons);
        assert_eq!(response.device_name, "Porch");

        match &response.detections[0] {
            DetectionOutcome::Failed {
                detection_id,
                error_kind,
                ..
            } => {
                assert_eq!(detection_id.as_deref(), Some("d1"));
                assert_eq!(error_kind, "decode");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(response.detections[1].match_result().unwrap().is_new());
        assert!(response.detections[2].match_result().is_some());
    }

    #[tokio::test]
    async fn test_same_person_twice_in_one_frame() {
        let processor = processor().await;

        let response = processor
            .process(request(vec![
                item("a", "person", png()),
                item("b", "person", png()),
            ]))
            .await
            .unwrap();

        let first = response.detections[0].match_result().unwrap();
        let second = response.detections[1].match_result().unwrap();
        assert!(first.is_new());
        assert!(!second.is_new());
        assert_eq!(first.identity_id(), second.identity_id());
    }

    #[tokio::test]
    async fn test_frame_without_persons() {
        let processor = processor().await;

        let response = processor
            .process(request(vec![
                item("v", "vehicle", Vec::new()),
                item("x", "animal", Vec::new()),
            ]))
            .await
            .unwrap();

        assert_eq!(response.detection_count, 2);
        assert!(!response.has_persons);
    }

    #[tokio::test]
    async fn test_uninitialized_engine_fails_every_item() {
        let engine = Arc::new(ReidEngine::new(EngineConfig::default()).unwrap());
        let processor = BatchProcessor::new(engine);

        let response = processor
            .process(request(vec![
                item("a", "person", png()),
                item("v", "vehicle", Vec::new()),
            ]))
            .await
            .unwrap();

        assert_eq!(response.detection_count, 0);
        assert!(!response.has_persons);
        assert!(response.detections.iter().all(DetectionOutcome::is_failed));
    }

    #[tokio::test]
    async fn test_person_without_image_fails_validation() {
        let processor = processor().await;

        let response = processor
            .process(request(vec![
                item("empty", "person", Vec::new()),
                item("ok", "person", png()),
            ]))
            .await
            .unwrap();

        match &response.detections[0] {
            DetectionOutcome::Failed { error_kind, .. } => {
                assert_eq!(error_kind, "invalid_request");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(response.detection_count, 1);
        assert!(response.has_persons);
    }

    #[tokio::test]
    async fn test_request_without_device_is_rejected() {
        let processor = processor().await;
        let mut bad = request(vec![item("a", "person", png())]);
        bad.device_id = String::new();

        let result = processor.process(bad).await;

        assert!(matches!(result, Err(ServiceError::InvalidRequest(_))));
        assert_eq!(processor.engine.stats().await.tracked_count, 0);
    }
}
