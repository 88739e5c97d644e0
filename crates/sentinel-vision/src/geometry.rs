//! IoU and non-maximum suppression.

use sentinel_models::{BoundingBox, Detection};

/// Default IoU above which a lower-confidence box is a duplicate.
pub const DEFAULT_NMS_IOU: f32 = 0.5;

/// Intersection over union of two boxes; 0 for disjoint or degenerate boxes.
#[inline]
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    a.iou(b)
}

/// Greedy non-maximum suppression.
///
/// Boxes are visited in descending confidence order (ties keep input order);
/// a box is dropped when its IoU with any already-kept box exceeds
/// `iou_threshold`. Suppression is class-agnostic.
pub fn nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    if detections.len() < 2 {
        return detections;
    }

    // Stable sort keeps original order for equal confidences.
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<Detection> = Vec::with_capacity(detections.len().min(64));
    for candidate in detections {
        let duplicate = keep
            .iter()
            .any(|kept| kept.bbox.iou(&candidate.bbox) > iou_threshold);
        if !duplicate {
            keep.push(candidate);
        }
    }

    keep
}
