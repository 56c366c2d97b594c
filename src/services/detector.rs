//! Product identification from a decoded upload.
//!
//! A detection model yields zero or more candidates; the pipeline only cares
//! about the single most confident one.

use crate::services::image_gate::DecodedImage;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectorError {
    /// The model ran and found nothing. A legitimate empty outcome, not a failure.
    #[error("No object detected")]
    NoDetection,

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Inference timed out after {0:?}")]
    Timeout(Duration),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// One candidate object reported by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_index: usize,
    pub label: String,
    pub confidence: f32,
}

/// Picks the most confident detection. Ties go to the earliest candidate in
/// model output order.
pub fn select_best(detections: Vec<Detection>) -> Result<Detection, DetectorError> {
    detections
        .into_iter()
        .reduce(|best, next| {
            if next.confidence > best.confidence {
                next
            } else {
                best
            }
        })
        .ok_or(DetectorError::NoDetection)
}

/// Capability interface for turning an image into a product label.
///
/// Implementations are loaded once at startup and shared across requests, so
/// they must tolerate concurrent calls.
#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &DecodedImage) -> Result<String, DetectorError>;
}
