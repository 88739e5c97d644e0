//! Still-frame capture from camera streams via FFmpeg.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sentinel_models::Camera;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{VisionError, VisionResult};
use crate::frame::Frame;

/// Produces one encoded still frame from a camera on demand.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture(&self, camera: &Camera) -> VisionResult<Frame>;
}

/// Builder for a single-frame FFmpeg snapshot command writing JPEG to stdout.
#[derive(Debug, Clone)]
pub struct SnapshotCommand {
    input: String,
    rtsp_transport: Option<String>,
    log_level: String,
}

impl SnapshotCommand {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            rtsp_transport: Some("tcp".to_string()),
            log_level: "error".to_string(),
        }
    }

    /// RTSP transport (`tcp`/`udp`); only applied to `rtsp://` inputs.
    pub fn rtsp_transport(mut self, transport: impl Into<String>) -> Self {
        self.rtsp_transport = Some(transport.into());
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.input.starts_with("rtsp://") || self.input.starts_with("rtsps://") {
            if let Some(ref transport) = self.rtsp_transport {
                args.push("-rtsp_transport".to_string());
                args.push(transport.clone());
            }
        }

        args.extend(
            [
                "-i",
                self.input.as_str(),
                "-frames:v",
                "1",
                "-f",
                "image2pipe",
                "-vcodec",
                "mjpeg",
                "-loglevel",
                self.log_level.as_str(),
                "-y",
                "-",
            ]
            .into_iter()
            .map(String::from),
        );

        args
    }
}

/// Check if FFmpeg is available.
pub fn ensure_ffmpeg() -> VisionResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| VisionError::FfmpegNotFound)
}

/// Frame source that shells out to FFmpeg once per frame.
#[derive(Debug, Clone)]
pub struct FfmpegFrameSource {
    ffmpeg: PathBuf,
    timeout: Duration,
    rtsp_transport: String,
}

impl FfmpegFrameSource {
    /// Locate FFmpeg on `PATH` and build a source with the given timeout.
    pub fn new(timeout: Duration, rtsp_transport: impl Into<String>) -> VisionResult<Self> {
        Ok(Self::with_binary(ensure_ffmpeg()?, timeout, rtsp_transport))
    }

    pub fn with_binary(
        ffmpeg: impl Into<PathBuf>,
        timeout: Duration,
        rtsp_transport: impl Into<String>,
    ) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            timeout,
            rtsp_transport: rtsp_transport.into(),
        }
    }

    async fn snapshot(&self, url: &str) -> VisionResult<Vec<u8>> {
        let args = SnapshotCommand::new(url)
            .rtsp_transport(self.rtsp_transport.clone())
            .build_args();

        // kill_on_drop reaps ffmpeg when the timeout drops the child
        let child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                    return Err(VisionError::capture_failed(
                        format!("ffmpeg exited with {}", output.status),
                        Some(stderr),
                    ));
                }
                if output.stdout.is_empty() {
                    return Err(VisionError::capture_failed("ffmpeg returned empty output", None));
                }
                Ok(output.stdout)
            }
            Ok(Err(e)) => Err(VisionError::Io(e)),
            Err(_) => Err(VisionError::CaptureTimeout(self.timeout.as_millis() as u64)),
        }
    }
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    async fn capture(&self, camera: &Camera) -> VisionResult<Frame> {
        let url = camera.source_url()?;
        match self.snapshot(&url).await {
            Ok(bytes) => {
                debug!(camera_id = %camera.id, size = bytes.len(), "Frame captured");
                Ok(Frame::new(camera.id, Utc::now(), bytes))
            }
            Err(e) => {
                warn!(camera_id = %camera.id, error = %e, "Frame capture failed");
                Err(e)
            }
        }
    }
}
