//! Per-user runtime settings.
//!
//! Everything here can change while the scheduler is running; the next turn
//! picks up the new values.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{DetectionClass, SamplingWindow};

/// Default number of frames captured per camera turn.
pub const DEFAULT_FRAMES_PER_CHECK: u32 = 3;

/// Upper bound on frames per turn so bursts stay short-lived.
pub const MAX_FRAMES_PER_CHECK: u32 = 10;

/// Thresholds for the detection and verification stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationThresholds {
    /// Minimum confidence for fire/smoke boxes
    pub fire_confidence: f32,
    /// Minimum confidence for weapon boxes
    pub weapon_confidence: f32,
    /// Minimum confidence for theft boxes
    pub theft_confidence: f32,
    /// Average burst IoU above which a detection is static
    pub static_iou: f32,
    /// Depth standard deviation above which a box is a real 3-D object
    pub depth_std: f32,
    /// Per-pixel gray-level change that counts as a flicker step
    pub flicker_pixel_delta: u8,
    /// Fraction of flickering pixels above which a region is flickering
    pub flicker_ratio: f32,
}

impl Default for VerificationThresholds {
    fn default() -> Self {
        Self {
            fire_confidence: DetectionClass::FireSmoke.default_confidence_threshold(),
            weapon_confidence: DetectionClass::Weapon.default_confidence_threshold(),
            theft_confidence: DetectionClass::Theft.default_confidence_threshold(),
            static_iou: 0.8,
            depth_std: 0.03,
            flicker_pixel_delta: 25,
            flicker_ratio: 0.02,
        }
    }
}

impl VerificationThresholds {
    /// Confidence threshold for a detection class.
    pub fn confidence_for(&self, class: DetectionClass) -> f32 {
        match class {
            DetectionClass::FireSmoke => self.fire_confidence,
            DetectionClass::Weapon => self.weapon_confidence,
            DetectionClass::Theft => self.theft_confidence,
        }
    }
}

/// Settings attached to one owning user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub sampling_window: SamplingWindow,
    pub frames_per_check: u32,
    pub thresholds: VerificationThresholds,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            sampling_window: SamplingWindow::default(),
            frames_per_check: DEFAULT_FRAMES_PER_CHECK,
            thresholds: VerificationThresholds::default(),
        }
    }
}

impl UserSettings {
    /// Frames per check bounded to `1..=MAX_FRAMES_PER_CHECK`.
    pub fn bounded_frames_per_check(&self) -> u32 {
        self.frames_per_check.clamp(1, MAX_FRAMES_PER_CHECK)
    }
}
