//! Captured frames and per-turn bursts.

use chrono::{DateTime, Utc};
use image::DynamicImage;
use sentinel_models::{best_detection, CameraId, Detection};

use crate::error::{VisionError, VisionResult};

/// One still frame pulled from a camera.
#[derive(Debug, Clone)]
pub struct Frame {
    pub camera_id: CameraId,
    pub captured_at: DateTime<Utc>,
    /// Encoded image bytes (JPEG from the frame source)
    pub bytes: Vec<u8>,
}

impl Frame {
    pub fn new(camera_id: CameraId, captured_at: DateTime<Utc>, bytes: Vec<u8>) -> Self {
        Self {
            camera_id,
            captured_at,
            bytes,
        }
    }

    /// Decode the encoded bytes into an image.
    pub fn decode(&self) -> VisionResult<DynamicImage> {
        if self.bytes.is_empty() {
            return Err(VisionError::invalid_frame("empty frame buffer"));
        }
        Ok(image::load_from_memory(&self.bytes)?)
    }
}

/// A decoded frame with the detections the model produced for it.
#[derive(Debug, Clone)]
pub struct BurstFrame {
    pub frame: Frame,
    pub image: DynamicImage,
    pub detections: Vec<Detection>,
}

impl BurstFrame {
    pub fn fired(&self) -> bool {
        !self.detections.is_empty()
    }

    /// Highest-confidence detection in this frame.
    pub fn best(&self) -> Option<&Detection> {
        best_detection(&self.detections)
    }
}

/// Ordered frames captured during one camera turn.
///
/// Length never exceeds the frames-per-check the burst was created with.
#[derive(Debug, Clone)]
pub struct FrameBurst {
    frames: Vec<BurstFrame>,
    capacity: usize,
}

impl FrameBurst {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a frame in capture order. Frames beyond capacity are refused.
    pub fn push(&mut self, frame: BurstFrame) -> VisionResult<()> {
        if self.frames.len() >= self.capacity {
            return Err(VisionError::invalid_frame(format!(
                "burst already holds {} frames",
                self.capacity
            )));
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn frames(&self) -> &[BurstFrame] {
        &self.frames
    }

    /// Frames whose model run produced at least one box.
    pub fn fired(&self) -> impl Iterator<Item = &BurstFrame> {
        self.frames.iter().filter(|f| f.fired())
    }

    pub fn fired_count(&self) -> usize {
        self.fired().count()
    }

    pub fn last_fired(&self) -> Option<&BurstFrame> {
        self.frames.iter().rev().find(|f| f.fired())
    }

    /// Decoded images in capture order.
    pub fn images(&self) -> Vec<&DynamicImage> {
        self.frames.iter().map(|f| &f.image).collect()
    }

    /// Detection lists in capture order.
    pub fn detections(&self) -> Vec<&[Detection]> {
        self.frames.iter().map(|f| f.detections.as_slice()).collect()
    }
}
