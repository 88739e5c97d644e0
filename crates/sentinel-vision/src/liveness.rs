//! Liveness verification: real 3-D object vs flat or frozen imagery.
//!
//! Two checks, chosen by detection class:
//! - depth: the spread of estimated depth inside the box. Prints and screens
//!   are near-planar and give an almost uniform depth.
//! - flicker: fire and smoke change intensity frame to frame. Pixels whose
//!   gray level jumps past a threshold in two consecutive steps are counted;
//!   still images and slowly drifting video do not show that pattern.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use sentinel_models::{BoundingBox, LivenessMethod, LivenessVerdict, VerificationThresholds};
use tracing::{debug, warn};

use crate::depth::DepthEstimator;
use crate::registry::ModelRegistry;

/// Depth model failures are treated as a real object.
pub const DEPTH_FAILURE_IS_LIVE: bool = true;

/// Bursts too short for the flicker test are treated as flickering.
pub const INSUFFICIENT_FRAMES_IS_LIVE: bool = true;

/// Minimum frames for the flicker test (two consecutive deltas).
pub const MIN_FLICKER_FRAMES: usize = 3;

/// Crops are downsampled to at most this width before differencing.
pub const FLICKER_PROC_WIDTH: u32 = 64;

/// Liveness checks configured from the verification thresholds.
#[derive(Debug, Clone, Copy)]
pub struct LivenessVerifier {
    depth_std: f32,
    flicker_pixel_delta: u8,
    flicker_ratio: f32,
}

impl Default for LivenessVerifier {
    fn default() -> Self {
        Self::from_thresholds(&VerificationThresholds::default())
    }
}

impl LivenessVerifier {
    pub fn from_thresholds(thresholds: &VerificationThresholds) -> Self {
        Self {
            depth_std: thresholds.depth_std,
            flicker_pixel_delta: thresholds.flicker_pixel_delta,
            flicker_ratio: thresholds.flicker_ratio,
        }
    }

    /// Run the check for `method`.
    ///
    /// `frames` are the burst images in capture order; `image` is the frame
    /// the box was detected in.
    pub fn verify(
        &self,
        method: LivenessMethod,
        models: &ModelRegistry,
        frames: &[&DynamicImage],
        image: &DynamicImage,
        bbox: &BoundingBox,
    ) -> LivenessVerdict {
        match method {
            LivenessMethod::Flicker => self.is_flickering(frames, bbox),
            LivenessMethod::Depth => match models.depth() {
                Ok(estimator) => self.is_real_3d(estimator.as_ref(), image, bbox),
                Err(e) => {
                    debug!(error = %e, "Depth model unavailable, failing open");
                    depth_fail_open()
                }
            },
        }
    }

    /// Depth-spread check on one frame.
    pub fn is_real_3d(
        &self,
        estimator: &dyn DepthEstimator,
        image: &DynamicImage,
        bbox: &BoundingBox,
    ) -> LivenessVerdict {
        let map = match estimator.estimate(image) {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "Depth estimation failed, failing open");
                return depth_fail_open();
            }
        };

        match map.std_in(bbox) {
            Some(std) => LivenessVerdict {
                is_live: std > self.depth_std,
                metric: std,
                method: LivenessMethod::Depth,
                fail_open: false,
            },
            None => depth_fail_open(),
        }
    }

    /// Two-step intensity-change check over ordered frames.
    pub fn is_flickering(&self, frames: &[&DynamicImage], bbox: &BoundingBox) -> LivenessVerdict {
        let fail_open = LivenessVerdict {
            is_live: INSUFFICIENT_FRAMES_IS_LIVE,
            metric: 0.0,
            method: LivenessMethod::Flicker,
            fail_open: true,
        };

        if frames.len() < MIN_FLICKER_FRAMES {
            return fail_open;
        }

        let Some(crops) = gray_crops(frames, bbox) else {
            return fail_open;
        };

        let ratio = flicker_ratio(&crops, self.flicker_pixel_delta);
        LivenessVerdict {
            is_live: ratio > self.flicker_ratio,
            metric: ratio,
            method: LivenessMethod::Flicker,
            fail_open: false,
        }
    }
}

fn depth_fail_open() -> LivenessVerdict {
    LivenessVerdict {
        is_live: DEPTH_FAILURE_IS_LIVE,
        metric: 0.0,
        method: LivenessMethod::Depth,
        fail_open: true,
    }
}

/// Crop the box from every frame, grayscale it and bring all crops to one
/// small common size. `None` when the box covers no pixels in some frame.
fn gray_crops(frames: &[&DynamicImage], bbox: &BoundingBox) -> Option<Vec<GrayImage>> {
    let mut target: Option<(u32, u32)> = None;
    let mut crops = Vec::with_capacity(frames.len());

    for frame in frames {
        let b = bbox.clamp(frame.width(), frame.height());
        let x = b.x1.floor() as u32;
        let y = b.y1.floor() as u32;
        let w = (b.x2.ceil() as u32).min(frame.width()).saturating_sub(x);
        let h = (b.y2.ceil() as u32).min(frame.height()).saturating_sub(y);
        if w == 0 || h == 0 {
            return None;
        }

        let (tw, th) = *target.get_or_insert_with(|| {
            let tw = w.min(FLICKER_PROC_WIDTH);
            let th = ((h as f32 * tw as f32 / w as f32).round() as u32).max(1);
            (tw, th)
        });

        let crop = frame
            .crop_imm(x, y, w, h)
            .resize_exact(tw, th, FilterType::Triangle)
            .to_luma8();
        crops.push(crop);
    }

    Some(crops)
}

/// Fraction of (pixel, triple) samples whose intensity moved by more than
/// `delta` in both consecutive steps.
fn flicker_ratio(crops: &[GrayImage], delta: u8) -> f32 {
    let mut hits = 0usize;
    let mut samples = 0usize;

    for triple in crops.windows(3) {
        let (a, b, c) = (&triple[0], &triple[1], &triple[2]);
        for ((pa, pb), pc) in a.pixels().zip(b.pixels()).zip(c.pixels()) {
            let d1 = pa[0].abs_diff(pb[0]);
            let d2 = pb[0].abs_diff(pc[0]);
            if d1 > delta && d2 > delta {
                hits += 1;
            }
            samples += 1;
        }
    }

    if samples == 0 {
        0.0
    } else {
        hits as f32 / samples as f32
    }
}
