//! Error types for capture, inference and verification.

use thiserror::Error;

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur while capturing or analysing frames.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("Frame capture failed: {message}")]
    CaptureFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Frame capture timed out after {0} ms")]
    CaptureTimeout(u64),

    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Model {model} unavailable: {reason}")]
    ModelUnavailable { model: String, reason: String },

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Camera configuration error: {0}")]
    Config(#[from] sentinel_models::CameraConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VisionError {
    /// Create a capture failure error.
    pub fn capture_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::CaptureFailed {
            message: message.into(),
            stderr,
        }
    }

    /// Create an inference failure error.
    pub fn inference_failed(message: impl Into<String>) -> Self {
        Self::InferenceFailed(message.into())
    }

    /// Create a model not found error.
    pub fn model_not_found(path: impl Into<String>) -> Self {
        Self::ModelNotFound(path.into())
    }

    /// Create a model unavailable error.
    pub fn model_unavailable(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid frame error.
    pub fn invalid_frame(message: impl Into<String>) -> Self {
        Self::InvalidFrame(message.into())
    }

    /// Whether the error only affects the current frame.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            VisionError::CaptureFailed { .. }
                | VisionError::CaptureTimeout(_)
                | VisionError::Decode(_)
                | VisionError::InvalidFrame(_)
                | VisionError::Io(_)
        )
    }
}
