//! Appearance embedding extraction.
//!
//! Turns one cropped detection image into a fixed-length embedding:
//! decode, resize to 256x128 (Lanczos3), scale to [0, 1], standardize with
//! ImageNet statistics, lay out as `[1, 3, H, W]`, run the model.
//!
//! The model is trusted to L2-normalize its output. A norm outside the
//! tolerance is logged, never corrected.

use std::sync::Arc;
use std::time::Instant;

use image::imageops::FilterType;
use ndarray::Array4;
use tracing::{debug, warn};

use crate::error::{ReidError, ReidResult};
use crate::metrics;
use crate::model::EmbeddingModel;

/// Output dimension of the re-identification model.
pub const EMBEDDING_DIM: usize = 512;

/// Model input height (person crops are tall and narrow).
pub const INPUT_HEIGHT: u32 = 256;

/// Model input width.
pub const INPUT_WIDTH: u32 = 128;

/// ImageNet per-channel mean (RGB).
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet per-channel standard deviation (RGB).
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Fixed-length appearance vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// Euclidean (L2) norm.
    pub fn norm(&self) -> f32 {
        self.0.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Dot product; equals cosine similarity for unit vectors.
    pub fn dot(&self, other: &Embedding) -> f32 {
        self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum()
    }
}

/// Decode and preprocess a cropped image into the model's input tensor.
pub fn preprocess(image_bytes: &[u8]) -> ReidResult<Array4<f32>> {
    let img = image::load_from_memory(image_bytes)
        .map_err(|e| ReidError::decode(format!("Failed to decode image: {e}")))?;

    let rgb = img.to_rgb8();
    let resized = image::imageops::resize(&rgb, INPUT_WIDTH, INPUT_HEIGHT, FilterType::Lanczos3);

    let (h, w) = (INPUT_HEIGHT as usize, INPUT_WIDTH as usize);
    let mut tensor = Array4::<f32>::zeros((1, 3, h, w));

    // HWC -> CHW with [0, 1] scaling and standardization
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            let v = pixel[c] as f32 / 255.0;
            tensor[[0, c, y as usize, x as usize]] = (v - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }

    Ok(tensor)
}

/// False for NaN, so a non-finite embedding is always reported.
fn norm_within_tolerance(norm: f32, tolerance: f32) -> bool {
    (norm - 1.0).abs() <= tolerance
}

/// Wraps an [`EmbeddingModel`] with the fixed preprocessing contract.
pub struct EmbeddingExtractor {
    model: Arc<dyn EmbeddingModel>,
    norm_tolerance: f32,
}

impl EmbeddingExtractor {
    pub fn new(model: Arc<dyn EmbeddingModel>, norm_tolerance: f32) -> Self {
        Self {
            model,
            norm_tolerance,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Extract an embedding from encoded image bytes.
    ///
    /// Blocking: decode, resize and inference all run on the calling thread.
    pub fn extract(&self, image_bytes: &[u8]) -> ReidResult<Embedding> {
        let tensor = preprocess(image_bytes)?;

        let started = Instant::now();
        let raw = self.model.embed(tensor)?;
        metrics::record_inference(started.elapsed().as_secs_f64());

        if raw.len() != EMBEDDING_DIM {
            return Err(ReidError::inference(format!(
                "Unexpected embedding dimension: expected {}, got {}",
                EMBEDDING_DIM,
                raw.len()
            )));
        }

        let embedding = Embedding::new(raw);
        let norm = embedding.norm();
        if !norm_within_tolerance(norm, self.norm_tolerance) {
            warn!(
                norm = norm,
                model = %self.model.name(),
                "Embedding norm deviates from 1.0"
            );
        } else {
            debug!(norm = norm, "Embedding extracted");
        }

        Ok(embedding)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Cursor;

    use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

    /// Encode a solid-color RGB image as PNG.
    pub fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    /// Unit vector along `axis`, optionally blended with a second axis.
    pub fn unit_vector(axis: usize, blend: Option<(usize, f32)>) -> Vec<f32> {
        let mut v = vec![0.0f32; super::EMBEDDING_DIM];
        v[axis] = 1.0;
        if let Some((other, weight)) = blend {
            v[other] = weight;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        v.iter().map(|x| x / norm).collect()
    }
}
