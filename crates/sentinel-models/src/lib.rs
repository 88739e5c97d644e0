//! Shared data models for the Sentinel camera threat scheduler.
//!
//! This crate provides Serde-serializable types for:
//! - Camera enrollment records and source URL resolution
//! - Detection classes, bounding boxes and model outputs
//! - Sampling windows and per-user verification thresholds
//! - Motion / liveness verdicts and confirmed alerts
//! - Scheduler status snapshots

pub mod alert;
pub mod camera;
pub mod detection;
pub mod detection_class;
pub mod sampling;
pub mod settings;
pub mod status;
pub mod verdict;

// Re-export common types
pub use alert::Alert;
pub use camera::{Camera, CameraConfigError, CameraId, ConnectionDescriptor};
pub use detection::{best_detection, BoundingBox, Detection, InferenceOutput};
pub use detection_class::{DetectionClass, DetectionClassParseError, LivenessMethod};
pub use sampling::{SamplingWindow, SamplingWindowParseError};
pub use settings::{
    UserSettings, VerificationThresholds, DEFAULT_FRAMES_PER_CHECK, MAX_FRAMES_PER_CHECK,
};
pub use status::{CameraStatus, SchedulerState, SchedulerStatus};
pub use verdict::{LivenessVerdict, MotionVerdict, VerificationSummary};
