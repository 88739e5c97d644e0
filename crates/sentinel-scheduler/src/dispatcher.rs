//! Alert hand-off to the external delivery path.
//!
//! Dispatch is best-effort: the scheduler spawns each dispatch on its own
//! task, logs failures and never retries or revisits the decision.

use async_trait::async_trait;
use sentinel_models::Alert;
use tokio::sync::mpsc;
use tracing::info;

use crate::error::{SchedulerError, SchedulerResult};

/// Consumer of confirmed alerts.
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    async fn dispatch(&self, alert: Alert) -> SchedulerResult<()>;
}

/// Writes each alert as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDispatcher;

#[async_trait]
impl AlertDispatcher for LogDispatcher {
    async fn dispatch(&self, alert: Alert) -> SchedulerResult<()> {
        info!(
            alert_id = %alert.id,
            user_id = %alert.user_id,
            camera_id = %alert.camera_id,
            camera_name = %alert.camera_name,
            class = %alert.detection_class,
            label = %alert.label,
            confidence = alert.confidence,
            evidence_bytes = alert.evidence_len(),
            motion_iou = alert.verification.motion.metric,
            liveness = alert.verification.liveness.metric,
            "Threat alert"
        );
        Ok(())
    }
}

/// Hands alerts to an external consumer over a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    tx: mpsc::Sender<Alert>,
}

impl ChannelDispatcher {
    /// Create a dispatcher and the receiving end for the consumer.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Alert>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl AlertDispatcher for ChannelDispatcher {
    async fn dispatch(&self, alert: Alert) -> SchedulerResult<()> {
        self.tx.try_send(alert).map_err(|e| match e {
            mpsc::error::TrySendError::Full(alert) => SchedulerError::dispatch(format!(
                "alert channel full, dropped alert {}",
                alert.id
            )),
            mpsc::error::TrySendError::Closed(alert) => SchedulerError::dispatch(format!(
                "alert channel closed, dropped alert {}",
                alert.id
            )),
        })
    }
}
