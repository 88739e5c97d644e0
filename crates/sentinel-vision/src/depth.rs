//! Monocular depth estimation.
//!
//! The depth model yields a relative inverse-depth map. Values are min-max
//! normalized to `0..=1` over the whole map so the spread inside a box is
//! comparable across frames and scenes.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::imageops::FilterType;
use image::DynamicImage;
use ort::session::Session;
use sentinel_models::BoundingBox;
use tracing::{debug, info};

use crate::error::{VisionError, VisionResult};
use crate::session::{create_session, nchw_tensor, run_single};

/// ImageNet channel means used by MiDaS-family models.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations.
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Interface for depth estimators.
pub trait DepthEstimator: Send + Sync {
    /// Estimate a normalized depth map for the image.
    fn estimate(&self, image: &DynamicImage) -> VisionResult<DepthMap>;
}

/// Normalized depth values on a grid, tied to the source frame size.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    pub width: u32,
    pub height: u32,
    pub source_width: u32,
    pub source_height: u32,
    /// Row-major values in `0..=1`
    values: Vec<f32>,
}

impl DepthMap {
    /// Build a map from raw model output, normalizing to `0..=1`.
    ///
    /// A constant map normalizes to all zeros.
    pub fn from_raw(
        width: u32,
        height: u32,
        raw: Vec<f32>,
        source_width: u32,
        source_height: u32,
    ) -> VisionResult<Self> {
        if raw.len() != (width as usize) * (height as usize) || raw.is_empty() {
            return Err(VisionError::inference_failed(format!(
                "depth output of {} values does not fit {width}x{height}",
                raw.len()
            )));
        }

        let (min, max) = raw
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;

        let values = raw
            .into_iter()
            .map(|v| {
                if !v.is_finite() || !(range > f32::EPSILON) {
                    0.0
                } else {
                    (v - min) / range
                }
            })
            .collect();

        Ok(Self {
            width,
            height,
            source_width,
            source_height,
            values,
        })
    }

    pub fn value(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Standard deviation of depth inside a box given in source-frame pixels.
    ///
    /// Returns `None` when the box covers no depth cells.
    pub fn std_in(&self, bbox: &BoundingBox) -> Option<f32> {
        let sx = self.width as f32 / self.source_width.max(1) as f32;
        let sy = self.height as f32 / self.source_height.max(1) as f32;
        let mapped = bbox.scale(sx, sy).clamp(self.width, self.height);

        let x0 = mapped.x1.floor() as u32;
        let y0 = mapped.y1.floor() as u32;
        let x1 = (mapped.x2.ceil() as u32).min(self.width);
        let y1 = (mapped.y2.ceil() as u32).min(self.height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        let mut n = 0usize;
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for y in y0..y1 {
            let row = y as usize * self.width as usize;
            for x in x0..x1 {
                let v = self.values[row + x as usize] as f64;
                sum += v;
                sum_sq += v * v;
                n += 1;
            }
        }

        let mean = sum / n as f64;
        let variance = (sum_sq / n as f64 - mean * mean).max(0.0);
        Some(variance.sqrt() as f32)
    }
}

/// Depth model configuration.
#[derive(Debug, Clone)]
pub struct DepthConfig {
    pub model_path: PathBuf,
    /// Square input side
    pub input_size: u32,
}

impl DepthConfig {
    pub fn in_dir(model_dir: impl AsRef<Path>) -> Self {
        Self {
            model_path: model_dir.as_ref().join("depth.onnx"),
            input_size: 256,
        }
    }
}

/// MiDaS-style ONNX depth estimator.
pub struct OnnxDepthEstimator {
    session: Mutex<Session>,
    config: DepthConfig,
}

impl OnnxDepthEstimator {
    pub fn new(config: DepthConfig) -> VisionResult<Self> {
        let session = create_session(&config.model_path, "depth")?;
        info!(
            model_path = %config.model_path.display(),
            input_size = config.input_size,
            "Depth estimator initialized"
        );
        Ok(Self {
            session: Mutex::new(session),
            config,
        })
    }

    fn preprocess(&self, image: &DynamicImage) -> Vec<f32> {
        let side = self.config.input_size;
        let resized = image
            .resize_exact(side, side, FilterType::Triangle)
            .to_rgb8();
        let plane = (side * side) as usize;
        let mut chw = vec![0.0f32; 3 * plane];
        for (x, y, pixel) in resized.enumerate_pixels() {
            let idx = y as usize * side as usize + x as usize;
            for c in 0..3 {
                chw[c * plane + idx] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
            }
        }
        chw
    }
}

impl DepthEstimator for OnnxDepthEstimator {
    fn estimate(&self, image: &DynamicImage) -> VisionResult<DepthMap> {
        if image.width() == 0 || image.height() == 0 {
            return Err(VisionError::invalid_frame("empty image for depth"));
        }
        let side = self.config.input_size as usize;
        let input = nchw_tensor(self.preprocess(image), side, side)?;
        let (shape, data) = run_single(&self.session, input)?;

        // [1, H, W] or [1, 1, H, W]
        let (h, w) = match shape.as_slice() {
            [.., h, w] => ((*h).max(0) as u32, (*w).max(0) as u32),
            _ => {
                return Err(VisionError::inference_failed(format!(
                    "unexpected depth output shape: {shape:?}"
                )))
            }
        };

        debug!(width = w, height = h, "Depth map estimated");
        DepthMap::from_raw(w, h, data, image.width(), image.height())
    }
}
