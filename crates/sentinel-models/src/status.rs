//! Scheduler status snapshots.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{CameraId, DetectionClass};

/// Lifecycle of the rotation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// No loop task; waiting for the first enrollment.
    #[default]
    Idle,
    /// A loop task is rotating through the active set.
    Running,
    /// Explicitly stopped; enrollment does not restart the loop.
    Stopped,
}

impl SchedulerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Running => "running",
            SchedulerState::Stopped => "stopped",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SchedulerState::Running)
    }
}

/// Per-camera runtime view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CameraStatus {
    pub is_alarmed: bool,
    /// ISO-8601 timestamp of the last completed turn
    pub last_checked: Option<DateTime<Utc>>,
    pub consecutive_static: u32,
    pub detection_class: DetectionClass,
}

/// Snapshot returned by the scheduler's status surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub running: bool,
    pub state: SchedulerState,
    pub queue_size: usize,
    pub per_camera: BTreeMap<CameraId, CameraStatus>,
}
