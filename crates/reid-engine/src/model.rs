//! Embedding model seam and the ONNX Runtime backend.
//!
//! The engine treats the re-identification network as a black box that maps
//! a preprocessed `[1, 3, H, W]` tensor to an embedding vector. Tests plug in
//! scripted models through the same trait.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::info;

use crate::error::{ReidError, ReidResult};

/// Name of the embedding output of the OSNet export.
const OUTPUT_NAME: &str = "output";

/// Black-box inference function producing appearance embeddings.
pub trait EmbeddingModel: Send + Sync {
    /// Run inference on one preprocessed, batched NCHW tensor.
    ///
    /// Returns the raw model output flattened to one dimension.
    fn embed(&self, input: Array4<f32>) -> ReidResult<Vec<f32>>;

    /// Model name for logging.
    fn name(&self) -> &str;
}

/// ONNX Runtime-backed OSNet model.
pub struct OrtEmbeddingModel {
    session: Mutex<Session>,
}

impl OrtEmbeddingModel {
    /// Load the model from an ONNX file.
    pub fn load(model_path: &Path) -> ReidResult<Self> {
        if !model_path.exists() {
            return Err(ReidError::model_not_found(model_path.display().to_string()));
        }

        let model_bytes = std::fs::read(model_path)
            .map_err(|e| ReidError::model_load(format!("ORT read model file: {e}")))?;

        let session = Session::builder()
            .map_err(|e| ReidError::model_load(format!("ORT session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ReidError::model_load(format!("ORT opt level: {e}")))?
            .commit_from_memory(model_bytes.as_slice())
            .map_err(|e| ReidError::model_load(format!("ORT load model: {e}")))?;

        info!(
            model_path = %model_path.display(),
            "Re-identification model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

/// Convert an NCHW array into an ORT input value.
fn to_input_tensor(input: Array4<f32>) -> ReidResult<Value> {
    let shape = input.shape().to_vec();
    let data = input.into_raw_vec();
    Tensor::from_array((shape, data.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| ReidError::inference(format!("ORT tensor: {e}")))
}

impl EmbeddingModel for OrtEmbeddingModel {
    fn embed(&self, input: Array4<f32>) -> ReidResult<Vec<f32>> {
        let tensor = to_input_tensor(input)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ReidError::internal("ORT session poisoned"))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| ReidError::inference(format!("ORT run failed: {e}")))?;

        let output = outputs
            .get(OUTPUT_NAME)
            .ok_or_else(|| ReidError::inference("ORT returned no embedding output"))?;

        // [1, 512] or [512]; squeeze by flattening.
        let (_shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ReidError::inference(format!("ORT extract: {e}")))?;

        Ok(data.to_vec())
    }

    fn name(&self) -> &str {
        "osnet_ain_onnx"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_model() {
        let result = OrtEmbeddingModel::load(Path::new("/nonexistent/osnet.onnx"));
        assert!(matches!(result, Err(ReidError::ModelNotFound(_))));
    }

    #[test]
    fn test_input_tensor_is_dynamic_value() {
        let input = Array4::<f32>::from_elem((1, 3, 256, 128), 0.5);
        let value = to_input_tensor(input).unwrap();

        let (_shape, data) = value.try_extract_tensor::<f32>().unwrap();
        assert_eq!(data.len(), 3 * 256 * 128);
        assert!((data[0] - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unreadable_model_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("osnet.onnx");
        std::fs::write(&path, b"not an onnx graph").unwrap();

        let result = OrtEmbeddingModel::load(&path);
        assert!(matches!(result, Err(ReidError::ModelLoad(_))));
    }
}
