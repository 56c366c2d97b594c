//! ONNX Runtime backed [`Classifier`] for YOLOv8-style detection exports.

use crate::config::DetectorConfig;
use crate::services::detector::{Classifier, Detection, DetectorError, select_best};
use crate::services::image_gate::DecodedImage;
use async_trait::async_trait;
use image::DynamicImage;
use image::imageops::FilterType;
use ndarray::Array4;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Box coordinates (cx, cy, w, h) precede the class scores in each output column.
const BOX_FIELDS: usize = 4;

/// Detector holding the one loaded model for the life of the process.
///
/// The runtime needs exclusive access to the session for a run, so calls are
/// serialized on a mutex. Inference happens on the blocking pool.
pub struct OnnxDetector {
    session: Arc<Mutex<Session>>,
    labels: Arc<Vec<String>>,
    input_size: u32,
    confidence_threshold: f32,
}

impl OnnxDetector {
    pub fn load(config: &DetectorConfig) -> Result<Self, DetectorError> {
        let model_path = Path::new(&config.model_path);
        info!("Loading detection model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(DetectorError::ModelLoad(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }

        let labels = load_labels(Path::new(&config.labels_path))?;

        let session = Session::builder()
            .map_err(|e| DetectorError::ModelLoad(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| {
                DetectorError::ModelLoad(format!("Failed to set optimization level: {e}"))
            })?
            .commit_from_file(model_path)
            .map_err(|e| DetectorError::ModelLoad(e.to_string()))?;

        info!(classes = labels.len(), "Detection model loaded");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            labels: Arc::new(labels),
            input_size: config.input_size,
            confidence_threshold: config.confidence_threshold,
        })
    }

    fn infer(
        session: &Mutex<Session>,
        image: &DynamicImage,
        input_size: u32,
        labels: &[String],
        threshold: f32,
    ) -> Result<Vec<Detection>, DetectorError> {
        let input = Tensor::from_array(preprocess(image, input_size))
            .map_err(|e| DetectorError::Inference(format!("Failed to create input tensor: {e}")))?;

        let mut session = session
            .lock()
            .map_err(|e| DetectorError::Inference(format!("Failed to lock session: {e}")))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| DetectorError::Inference(e.to_string()))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::Inference(format!("Failed to extract output: {e}")))?;

        decode_output(shape, data, labels, threshold)
    }
}

#[async_trait]
impl Classifier for OnnxDetector {
    async fn classify(&self, image: &DecodedImage) -> Result<String, DetectorError> {
        let session = Arc::clone(&self.session);
        let labels = Arc::clone(&self.labels);
        let image = image.image().clone();
        let (input_size, threshold) = (self.input_size, self.confidence_threshold);

        let detections = tokio::task::spawn_blocking(move || {
            Self::infer(&session, &image, input_size, &labels, threshold)
        })
        .await
        .map_err(|e| DetectorError::Inference(e.to_string()))??;

        debug!(candidates = detections.len(), "Inference finished");

        let best = select_best(detections)?;
        info!(label = %best.label, confidence = best.confidence, "Object detected");
        Ok(best.label)
    }
}

/// Reads class names, one per line, in class-index order.
fn load_labels(path: &Path) -> Result<Vec<String>, DetectorError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DetectorError::ModelLoad(format!("Failed to read labels {}: {e}", path.display()))
    })?;

    let labels: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    if labels.is_empty() {
        return Err(DetectorError::ModelLoad(format!(
            "Labels file is empty: {}",
            path.display()
        )));
    }

    Ok(labels)
}

/// RGB, stretched to `size`², scaled to [0, 1], laid out NCHW.
fn preprocess(image: &DynamicImage, size: u32) -> Array4<f32> {
    let rgb = image.resize_exact(size, size, FilterType::Triangle).to_rgb8();
    let side = size as usize;

    let mut input = Array4::<f32>::zeros((1, 3, side, side));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for (channel, value) in pixel.0.iter().enumerate() {
            input[[0, channel, y, x]] = f32::from(*value) / 255.0;
        }
    }
    input
}

/// Decodes a `[1, 4 + classes, anchors]` output into candidates at or above
/// `threshold`, keeping model output order.
fn decode_output(
    shape: &[i64],
    data: &[f32],
    labels: &[String],
    threshold: f32,
) -> Result<Vec<Detection>, DetectorError> {
    let [_, features, anchors] = shape else {
        return Err(DetectorError::Inference(format!(
            "Unexpected output shape {shape:?}"
        )));
    };

    let (features, anchors) = (
        usize::try_from(*features).unwrap_or(0),
        usize::try_from(*anchors).unwrap_or(0),
    );

    let expected = features.checked_mul(anchors);
    if features <= BOX_FIELDS || expected != Some(data.len()) {
        return Err(DetectorError::Inference(format!(
            "Output shape {shape:?} does not match {} values",
            data.len()
        )));
    }

    let classes = features - BOX_FIELDS;
    let mut detections = Vec::new();

    for anchor in 0..anchors {
        let score_at = |class: usize| data[(BOX_FIELDS + class) * anchors + anchor];

        let (class_index, confidence) = (0..classes)
            .map(|c| (c, score_at(c)))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if confidence >= threshold {
            let label = labels
                .get(class_index)
                .cloned()
                .unwrap_or_else(|| format!("class {class_index}"));

            detections.push(Detection {
                class_index,
                label,
                confidence,
            });
        }
    }

    Ok(detections)
}
