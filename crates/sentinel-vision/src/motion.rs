//! Burst motion analysis.
//!
//! A detection that lands on the same pixels in every frame of a burst is
//! most likely a poster, a painting or a paused screen. The verifier takes
//! the single best box of each fired frame and averages the IoU of
//! consecutive pairs; a high average means the detection is static.

use sentinel_models::{best_detection, Detection, MotionVerdict};
use tracing::trace;

use crate::frame::FrameBurst;

/// Default average IoU above which a burst is static.
pub const DEFAULT_STATIC_IOU: f32 = 0.8;

/// Minimum fired frames needed to measure motion.
pub const MIN_MOTION_FRAMES: usize = 2;

/// Verdict used when there are too few fired frames to compare.
///
/// Reports "moving" so the liveness stage still gets to decide instead of
/// the detection being dropped silently.
pub const INSUFFICIENT_MOTION_EVIDENCE: MotionVerdict = MotionVerdict {
    is_static: false,
    metric: 0.0,
    frames_considered: 0,
};

/// Classifies a burst's detections as static or moving.
#[derive(Debug, Clone, Copy)]
pub struct MotionVerifier {
    static_iou: f32,
}

impl Default for MotionVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_STATIC_IOU)
    }
}

impl MotionVerifier {
    pub fn new(static_iou: f32) -> Self {
        Self { static_iou }
    }

    pub fn static_iou(&self) -> f32 {
        self.static_iou
    }

    /// Analyze the fired frames of a burst.
    pub fn analyze(&self, burst: &FrameBurst) -> MotionVerdict {
        let detections = burst.detections();
        self.analyze_detections(&detections)
    }

    /// Analyze per-frame detection lists in capture order.
    ///
    /// Frames with no detections are skipped.
    pub fn analyze_detections(&self, frames: &[&[Detection]]) -> MotionVerdict {
        let boxes: Vec<_> = frames
            .iter()
            .filter_map(|dets| best_detection(dets))
            .map(|d| d.bbox)
            .collect();

        if boxes.len() < MIN_MOTION_FRAMES {
            return MotionVerdict {
                frames_considered: boxes.len(),
                ..INSUFFICIENT_MOTION_EVIDENCE
            };
        }

        let pairs = boxes.len() - 1;
        let total: f32 = boxes.windows(2).map(|w| w[0].iou(&w[1])).sum();
        let average = total / pairs as f32;

        trace!(frames = boxes.len(), average_iou = average, "Motion analyzed");

        MotionVerdict {
            is_static: average > self.static_iou,
            metric: average,
            frames_considered: boxes.len(),
        }
    }
}
