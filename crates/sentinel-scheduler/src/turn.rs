//! One camera turn: capture a burst, detect, verify, decide.
//!
//! Every failure degrades only the frame or turn it happened in:
//! - a failed capture or decode skips that frame
//! - an unavailable or failing model yields no detections for the frame
//! - liveness model failures fail open (see `sentinel_vision::liveness`)

use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use sentinel_models::{
    Alert, Camera, Detection, DetectionClass, MotionVerdict, UserSettings, VerificationSummary,
};
use sentinel_vision::{
    BurstFrame, Frame, FrameBurst, FrameSource, LivenessVerifier, ModelRegistry, MotionVerifier,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::metrics;
use crate::pacing::Pacing;

/// What a turn decided.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// No frame could be captured and decoded.
    NoFrames,
    /// Frames were captured but the model never fired.
    NoDetection { frames: usize },
    /// The model fired on the same pixels throughout the burst.
    Static { motion: MotionVerdict },
    /// Moving detection that failed the liveness check.
    Suppressed { verification: VerificationSummary },
    /// Confirmed threat.
    Confirmed(Box<Alert>),
}

impl TurnOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnOutcome::NoFrames => "no_frames",
            TurnOutcome::NoDetection { .. } => "no_detection",
            TurnOutcome::Static { .. } => "static",
            TurnOutcome::Suppressed { .. } => "suppressed",
            TurnOutcome::Confirmed(_) => "confirmed",
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, TurnOutcome::Confirmed(_))
    }

    pub fn alert(&self) -> Option<&Alert> {
        match self {
            TurnOutcome::Confirmed(alert) => Some(alert.as_ref()),
            _ => None,
        }
    }
}

/// Result of one scheduler tick.
#[derive(Debug, Clone)]
pub struct TurnReport {
    /// Monotonic turn number
    pub turn: u64,
    pub camera: Camera,
    /// Intervals fixed at the start of the turn
    pub pacing: Pacing,
    pub outcome: TurnOutcome,
    /// Delay before the next turn; `None` when the active set is empty
    pub next_delay: Option<Duration>,
    pub elapsed: Duration,
}

/// Collaborators a turn needs.
#[derive(Clone)]
pub struct TurnContext {
    pub frame_source: Arc<dyn FrameSource>,
    pub models: Arc<ModelRegistry>,
    pub clock: Arc<dyn Clock>,
}

/// Run one full turn for `camera`.
pub async fn run_turn(
    ctx: &TurnContext,
    camera: &Camera,
    settings: &UserSettings,
    frame_interval: Duration,
) -> TurnOutcome {
    let class = camera.detection_class;
    let burst = capture_burst(ctx, camera, settings, frame_interval).await;

    if burst.is_empty() {
        debug!(camera_id = %camera.id, "No frames captured this turn");
        return TurnOutcome::NoFrames;
    }
    if burst.fired_count() == 0 {
        debug!(camera_id = %camera.id, frames = burst.len(), "No detection");
        return TurnOutcome::NoDetection { frames: burst.len() };
    }

    let motion = MotionVerifier::new(settings.thresholds.static_iou).analyze(&burst);
    if motion.is_static {
        debug!(
            camera_id = %camera.id,
            average_iou = motion.metric,
            "Static detection suppressed"
        );
        metrics::record_alert_suppressed(class, "static");
        return TurnOutcome::Static { motion };
    }

    let verifier = LivenessVerifier::from_thresholds(&settings.thresholds);
    let models = ctx.models.clone();
    let verified = tokio::task::spawn_blocking(move || {
        let last = burst.last_fired()?;
        let best = last.best()?.clone();
        let liveness = verifier.verify(
            class.liveness_method(),
            &models,
            &burst.images(),
            &last.image,
            &best.bbox,
        );
        Some((best, last.frame.clone(), liveness))
    })
    .await;

    let (best, frame, liveness) = match verified {
        Ok(Some(found)) => found,
        Ok(None) => return TurnOutcome::NoDetection { frames: 0 },
        Err(e) => {
            warn!(camera_id = %camera.id, error = %e, "Liveness task failed");
            return TurnOutcome::NoDetection { frames: 0 };
        }
    };

    let verification = VerificationSummary { motion, liveness };
    if !liveness.is_live {
        debug!(
            camera_id = %camera.id,
            method = liveness.method.as_str(),
            metric = liveness.metric,
            "Detection failed liveness"
        );
        metrics::record_alert_suppressed(class, "not_live");
        return TurnOutcome::Suppressed { verification };
    }

    let alert = build_alert(ctx, camera, best, frame, verification);
    info!(
        camera_id = %camera.id,
        user_id = %camera.user_id,
        class = %class,
        label = %alert.label,
        confidence = alert.confidence,
        fail_open = liveness.fail_open,
        "Threat confirmed"
    );
    metrics::record_alert_confirmed(class);
    TurnOutcome::Confirmed(Box::new(alert))
}

/// Capture up to `frames_per_check` frames, running the class model on each.
async fn capture_burst(
    ctx: &TurnContext,
    camera: &Camera,
    settings: &UserSettings,
    frame_interval: Duration,
) -> FrameBurst {
    let frames = settings.bounded_frames_per_check() as usize;
    let class = camera.detection_class;
    let threshold = settings.thresholds.confidence_for(class);
    let mut burst = FrameBurst::with_capacity(frames);

    for index in 0..frames {
        if index > 0 {
            ctx.clock.sleep(frame_interval).await;
        }

        let frame = match ctx.frame_source.capture(camera).await {
            Ok(frame) => frame,
            Err(e) => {
                warn!(camera_id = %camera.id, frame = index, error = %e, "Skipping frame");
                metrics::record_capture_failure(class);
                continue;
            }
        };

        let models = ctx.models.clone();
        let analyzed =
            tokio::task::spawn_blocking(move || analyze_frame(&models, class, frame, threshold))
                .await;

        match analyzed {
            Ok(Some(burst_frame)) => {
                if let Err(e) = burst.push(burst_frame) {
                    warn!(camera_id = %camera.id, error = %e, "Burst full");
                }
            }
            Ok(None) => metrics::record_capture_failure(class),
            Err(e) => {
                warn!(camera_id = %camera.id, frame = index, error = %e, "Frame task failed");
                metrics::record_inference_failure(class);
            }
        }
    }

    burst
}

/// Decode one frame and run the class detector. `None` if the frame is unusable.
fn analyze_frame(
    models: &ModelRegistry,
    class: DetectionClass,
    frame: Frame,
    threshold: f32,
) -> Option<BurstFrame> {
    let image: DynamicImage = match frame.decode() {
        Ok(image) => image,
        Err(e) => {
            warn!(camera_id = %frame.camera_id, error = %e, "Frame decode failed");
            return None;
        }
    };

    let detections: Vec<Detection> = match models.detector(class) {
        Ok(detector) => match detector.detect(&image, threshold) {
            Ok(detections) => detections,
            Err(e) => {
                warn!(camera_id = %frame.camera_id, class = %class, error = %e, "Inference failed");
                metrics::record_inference_failure(class);
                Vec::new()
            }
        },
        Err(e) => {
            debug!(class = %class, error = %e, "Detector unavailable");
            metrics::record_inference_failure(class);
            Vec::new()
        }
    };

    Some(BurstFrame {
        frame,
        image,
        detections,
    })
}

fn build_alert(
    ctx: &TurnContext,
    camera: &Camera,
    best: Detection,
    frame: Frame,
    verification: VerificationSummary,
) -> Alert {
    Alert {
        id: Uuid::new_v4(),
        user_id: camera.user_id.clone(),
        camera_id: camera.id,
        camera_name: camera.display_name(),
        detection_class: camera.detection_class,
        label: best.label,
        confidence: best.confidence,
        bbox: best.bbox,
        evidence_image_bytes: frame.bytes,
        verification,
        detected_at: ctx.clock.now(),
    }
}
