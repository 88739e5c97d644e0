//! Threat detection adapters (YOLO-style ONNX models).
//!
//! One adapter instance exists per detection class. Each one:
//! 1. letterboxes the frame to the model's square input
//! 2. runs the ONNX session
//! 3. keeps the best class per candidate above the confidence threshold
//! 4. maps boxes back to source pixels, clamps them, and applies NMS

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::DynamicImage;
use ndarray::Array2;
use ort::session::Session;
use sentinel_models::{BoundingBox, Detection, DetectionClass, InferenceOutput};
use tracing::{debug, info};

use crate::error::{VisionError, VisionResult};
use crate::geometry::{nms, DEFAULT_NMS_IOU};
use crate::letterbox::{letterbox, LetterboxMeta};
use crate::session::{create_session, nchw_tensor, run_single};

/// Default square input side for the detection models.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Interface every detection-class model adapter implements.
pub trait ThreatDetector: Send + Sync {
    /// Class this adapter detects.
    fn class(&self) -> DetectionClass;

    /// Confidence threshold used when the caller supplies none.
    fn default_threshold(&self) -> f32;

    /// Detect threats in a decoded image; boxes are in source-pixel space.
    fn detect(&self, image: &DynamicImage, confidence_threshold: f32)
        -> VisionResult<Vec<Detection>>;

    /// Decode encoded image bytes and detect with the default threshold.
    fn infer(&self, image_bytes: &[u8]) -> VisionResult<InferenceOutput> {
        let image = image::load_from_memory(image_bytes)?;
        let boxes = self.detect(&image, self.default_threshold())?;
        Ok(InferenceOutput { boxes })
    }
}

/// Configuration for one detection model.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub class: DetectionClass,
    /// Path to ONNX model file
    pub model_path: PathBuf,
    /// Class labels in model output order
    pub labels: Vec<String>,
    /// Square input side (model expects square input)
    pub input_size: u32,
    /// Confidence threshold for detections
    pub confidence_threshold: f32,
    /// IoU threshold for NMS
    pub nms_threshold: f32,
}

impl DetectorConfig {
    /// Defaults for a class, with the model file looked up under `model_dir`.
    pub fn for_class(class: DetectionClass, model_dir: impl AsRef<Path>) -> Self {
        let file = match class {
            DetectionClass::FireSmoke => "fire_smoke.onnx",
            DetectionClass::Weapon => "weapon.onnx",
            DetectionClass::Theft => "theft.onnx",
        };
        Self {
            class,
            model_path: model_dir.as_ref().join(file),
            labels: class.default_labels().iter().map(|s| s.to_string()).collect(),
            input_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: class.default_confidence_threshold(),
            nms_threshold: DEFAULT_NMS_IOU,
        }
    }
}

/// ONNX Runtime-backed detector for one class.
pub struct OnnxThreatDetector {
    session: Mutex<Session>,
    config: DetectorConfig,
}

impl OnnxThreatDetector {
    /// Load the model described by `config`.
    pub fn new(config: DetectorConfig) -> VisionResult<Self> {
        let session = create_session(&config.model_path, config.class.as_str())?;
        info!(
            class = %config.class,
            model_path = %config.model_path.display(),
            input_size = config.input_size,
            labels = ?config.labels,
            "Threat detector initialized"
        );
        Ok(Self {
            session: Mutex::new(session),
            config,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

impl ThreatDetector for OnnxThreatDetector {
    fn class(&self) -> DetectionClass {
        self.config.class
    }

    fn default_threshold(&self) -> f32 {
        self.config.confidence_threshold
    }

    fn detect(
        &self,
        image: &DynamicImage,
        confidence_threshold: f32,
    ) -> VisionResult<Vec<Detection>> {
        let size = self.config.input_size as usize;
        let (chw, meta) = letterbox(image, self.config.input_size)?;
        let input = nchw_tensor(chw, size, size)?;

        let (shape, data) = run_single(&self.session, input)?;
        let detections = decode_predictions(
            &shape,
            &data,
            &self.config.labels,
            confidence_threshold,
            self.config.nms_threshold,
            &meta,
        )?;

        debug!(
            class = %self.config.class,
            count = detections.len(),
            "Threat detection completed"
        );
        Ok(detections)
    }
}

/// Decode a YOLO-style prediction tensor into source-space detections.
///
/// Accepts `[1, 4+C, N]` (feature-major) and `[1, N, 4+C]` (row-major)
/// layouts, with or without the leading batch axis. Each candidate holds
/// `cx, cy, w, h` in model-input pixels followed by `C` class scores.
pub fn decode_predictions(
    shape: &[i64],
    data: &[f32],
    labels: &[String],
    confidence_threshold: f32,
    nms_threshold: f32,
    meta: &LetterboxMeta,
) -> VisionResult<Vec<Detection>> {
    if labels.is_empty() {
        return Err(VisionError::inference_failed("detector has no class labels"));
    }
    let features = 4 + labels.len();
    let candidates = candidate_rows(shape, data, features)?;

    let mut detections = Vec::new();
    for row in candidates.rows() {
        let (best_idx, best_score) = row
            .iter()
            .skip(4)
            .enumerate()
            .fold((0usize, f32::NEG_INFINITY), |(bi, bs), (i, &s)| {
                if s > bs {
                    (i, s)
                } else {
                    (bi, bs)
                }
            });

        if !best_score.is_finite() || best_score < confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        if !(cx.is_finite() && cy.is_finite() && w.is_finite() && h.is_finite()) {
            continue;
        }
        if w <= 0.0 || h <= 0.0 {
            continue;
        }

        let bbox = meta.map_box_to_raw(&BoundingBox::from_center(cx, cy, w, h));
        if bbox.is_degenerate() {
            continue;
        }

        detections.push(Detection::new(labels[best_idx].clone(), best_score, bbox));
    }

    Ok(nms(detections, nms_threshold))
}

/// Reshape the raw output into one row per candidate.
fn candidate_rows(shape: &[i64], data: &[f32], features: usize) -> VisionResult<Array2<f32>> {
    let (a, b) = match *shape {
        [1, a, b] | [a, b] => (a.max(0) as usize, b.max(0) as usize),
        _ => {
            return Err(VisionError::inference_failed(format!(
                "unexpected detector output shape: {shape:?}"
            )))
        }
    };

    if data.len() != a * b {
        return Err(VisionError::inference_failed(format!(
            "output length {} does not match shape {shape:?}",
            data.len()
        )));
    }

    let array = Array2::from_shape_vec((a, b), data.to_vec())
        .map_err(|e| VisionError::inference_failed(format!("reshape output: {e}")))?;

    if a == features {
        Ok(array.t().to_owned())
    } else if b == features {
        Ok(array)
    } else {
        Err(VisionError::inference_failed(format!(
            "output shape {shape:?} has no axis of {features} features"
        )))
    }
}
