//! Detection boxes and model outputs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in corner form, source-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    /// Create a new box from corners.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create from center form (cx, cy, w, h).
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    #[inline]
    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    /// Box area in pixels (0 for inverted boxes).
    #[inline]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// True when the box encloses no area.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.x2 > self.x1 && self.y2 > self.y1) || !self.area().is_finite()
    }

    /// Center point.
    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Compute Intersection over Union with another box.
    ///
    /// Disjoint or degenerate inputs yield 0.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        if self.is_degenerate() || other.is_degenerate() {
            return 0.0;
        }

        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) * (y2 - y1);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Order the corners and clamp them to `[0, width] x [0, height]`.
    pub fn clamp(&self, width: u32, height: u32) -> BoundingBox {
        let (w, h) = (width as f32, height as f32);
        let (x1, x2) = (self.x1.min(self.x2), self.x1.max(self.x2));
        let (y1, y2) = (self.y1.min(self.y2), self.y1.max(self.y2));

        BoundingBox {
            x1: x1.clamp(0.0, w),
            y1: y1.clamp(0.0, h),
            x2: x2.clamp(0.0, w),
            y2: y2.clamp(0.0, h),
        }
    }

    /// Scale both axes independently (e.g. into a depth map's space).
    pub fn scale(&self, sx: f32, sy: f32) -> BoundingBox {
        BoundingBox {
            x1: self.x1 * sx,
            y1: self.y1 * sy,
            x2: self.x2 * sx,
            y2: self.y2 * sy,
        }
    }
}

/// A single detected object.
///
/// Serializes as the row `[x1, y1, x2, y2, label, confidence]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "DetectionRow", from = "DetectionRow")]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct DetectionRow(f32, f32, f32, f32, String, f32);

impl From<Detection> for DetectionRow {
    fn from(d: Detection) -> Self {
        DetectionRow(d.bbox.x1, d.bbox.y1, d.bbox.x2, d.bbox.y2, d.label, d.confidence)
    }
}

impl From<DetectionRow> for Detection {
    fn from(r: DetectionRow) -> Self {
        Detection {
            label: r.4,
            confidence: r.5,
            bbox: BoundingBox::new(r.0, r.1, r.2, r.3),
        }
    }
}

/// Model adapter output for one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceOutput {
    pub boxes: Vec<Detection>,
}

impl InferenceOutput {
    /// Highest-confidence detection, first one wins on ties.
    pub fn best(&self) -> Option<&Detection> {
        best_detection(&self.boxes)
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// Highest-confidence detection in a slice, first one wins on ties.
pub fn best_detection(detections: &[Detection]) -> Option<&Detection> {
    detections.iter().fold(None, |best: Option<&Detection>, d| match best {
        Some(b) if b.confidence >= d.confidence => Some(b),
        _ => Some(d),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_identical_is_one() {
        let a = BoundingBox::new(10.0, 10.0, 50.0, 50.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_disjoint_is_zero() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_degenerate_is_zero() {
        let a = BoundingBox::new(5.0, 5.0, 5.0, 20.0);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn test_iou_half_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        // 50 / 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
        assert!((a.iou(&b) - b.iou(&a)).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_orders_and_bounds() {
        let b = BoundingBox::new(120.0, -5.0, -10.0, 40.0).clamp(100, 30);
        assert_eq!(b, BoundingBox::new(0.0, 0.0, 100.0, 30.0));
        assert!(b.x1 <= b.x2 && b.y1 <= b.y2);
    }

    #[test]
    fn test_from_center() {
        let b = BoundingBox::from_center(50.0, 50.0, 20.0, 10.0);
        assert_eq!(b, BoundingBox::new(40.0, 45.0, 60.0, 55.0));
    }

    #[test]
    fn test_detection_row_format() {
        let d = Detection::new("fire", 0.9, BoundingBox::new(1.0, 2.0, 3.0, 4.0));
        let json = serde_json::to_string(&InferenceOutput { boxes: vec![d.clone()] }).unwrap();
        assert_eq!(json, r#"{"boxes":[[1.0,2.0,3.0,4.0,"fire",0.9]]}"#);

        let back: InferenceOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(back.boxes[0], d);
    }

    #[test]
    fn test_best_detection_prefers_first_on_tie() {
        let a = Detection::new("gun", 0.8, BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        let b = Detection::new("knife", 0.8, BoundingBox::new(2.0, 2.0, 3.0, 3.0));
        let c = Detection::new("gun", 0.7, BoundingBox::new(4.0, 4.0, 5.0, 5.0));
        let dets = vec![a, b, c];
        assert_eq!(best_detection(&dets).unwrap().label, "gun");
        assert!(best_detection(&[]).is_none());
    }
}
