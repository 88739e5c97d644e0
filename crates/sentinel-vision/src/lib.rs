//! Frame capture, threat detection and verification.
//!
//! This crate provides:
//! - IoU / non-maximum suppression and letterbox coordinate mapping
//! - ONNX Runtime adapters for the detection classes and the depth model
//! - Lazily loaded, process-wide model handles with cached load failures
//! - FFmpeg still-frame capture with a bounded timeout
//! - Motion (burst IoU) and liveness (depth spread / flicker) verifiers

pub mod config;
pub mod depth;
pub mod detector;
pub mod error;
pub mod frame;
pub mod frame_source;
pub mod geometry;
pub mod letterbox;
pub mod liveness;
pub mod motion;
pub mod registry;
mod session;

pub use config::VisionConfig;
pub use depth::{DepthConfig, DepthEstimator, DepthMap, OnnxDepthEstimator};
pub use detector::{
    decode_predictions, DetectorConfig, OnnxThreatDetector, ThreatDetector, DEFAULT_INPUT_SIZE,
};
pub use error::{VisionError, VisionResult};
pub use frame::{BurstFrame, Frame, FrameBurst};
pub use frame_source::{ensure_ffmpeg, FfmpegFrameSource, FrameSource, SnapshotCommand};
pub use geometry::{iou, nms, DEFAULT_NMS_IOU};
pub use letterbox::{letterbox, LetterboxMeta, PADDING_VALUE};
pub use liveness::{LivenessVerifier, DEPTH_FAILURE_IS_LIVE, INSUFFICIENT_FRAMES_IS_LIVE};
pub use motion::{MotionVerifier, DEFAULT_STATIC_IOU, INSUFFICIENT_MOTION_EVIDENCE};
pub use registry::{ModelHandle, ModelRegistry};
