//! Scheduler error types.

use sentinel_models::{CameraConfigError, CameraId, SamplingWindowParseError};
use thiserror::Error;

pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Camera configuration error: {0}")]
    CameraConfig(#[from] CameraConfigError),

    #[error("Camera {0} is already enrolled")]
    AlreadyEnrolled(CameraId),

    #[error("Camera {0} is not active")]
    CameraInactive(CameraId),

    #[error("Invalid sampling window: {0}")]
    SamplingWindow(#[from] SamplingWindowParseError),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Alert dispatch failed: {0}")]
    Dispatch(String),

    #[error("Vision error: {0}")]
    Vision(#[from] sentinel_vision::VisionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchedulerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_setting(msg: impl Into<String>) -> Self {
        Self::InvalidSetting(msg.into())
    }

    pub fn dispatch(msg: impl Into<String>) -> Self {
        Self::Dispatch(msg.into())
    }
}
