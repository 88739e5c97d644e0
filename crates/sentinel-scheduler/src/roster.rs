//! Active camera set and per-camera runtime state.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use sentinel_models::{Camera, CameraId, CameraStatus};

use crate::error::{SchedulerError, SchedulerResult};

/// Ephemeral per-camera state. Exists exactly while the camera is enrolled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraRuntimeState {
    pub last_checked: Option<DateTime<Utc>>,
    pub is_alarmed: bool,
    pub consecutive_static: u32,
}

/// Enrollment-ordered camera list with a round-robin cursor.
///
/// The cursor always points at the next camera to visit and is kept within
/// bounds across insertions and removals.
#[derive(Debug, Default)]
pub struct Roster {
    cameras: Vec<Camera>,
    runtime: HashMap<CameraId, CameraRuntimeState>,
    cursor: usize,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    pub fn contains(&self, id: CameraId) -> bool {
        self.runtime.contains_key(&id)
    }

    /// Append a camera at the end of the rotation.
    pub fn insert(&mut self, camera: Camera) -> SchedulerResult<()> {
        if self.contains(camera.id) {
            return Err(SchedulerError::AlreadyEnrolled(camera.id));
        }
        self.runtime.insert(camera.id, CameraRuntimeState::default());
        self.cameras.push(camera);
        Ok(())
    }

    /// Remove a camera and its runtime state.
    pub fn remove(&mut self, id: CameraId) -> Option<Camera> {
        let index = self.cameras.iter().position(|c| c.id == id)?;
        let camera = self.cameras.remove(index);
        self.runtime.remove(&id);

        if index < self.cursor {
            self.cursor -= 1;
        }
        if self.cursor >= self.cameras.len() {
            self.cursor = 0;
        }
        Some(camera)
    }

    /// Camera the cursor points at, without advancing.
    pub fn peek(&self) -> Option<&Camera> {
        self.cameras.get(self.cursor)
    }

    /// Take the camera at the cursor and advance the cursor.
    pub fn advance(&mut self) -> Option<Camera> {
        if self.cameras.is_empty() {
            self.cursor = 0;
            return None;
        }
        if self.cursor >= self.cameras.len() {
            self.cursor = 0;
        }
        let camera = self.cameras[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.cameras.len();
        Some(camera)
    }

    pub fn state(&self, id: CameraId) -> Option<&CameraRuntimeState> {
        self.runtime.get(&id)
    }

    pub fn state_mut(&mut self, id: CameraId) -> Option<&mut CameraRuntimeState> {
        self.runtime.get_mut(&id)
    }

    pub fn cameras(&self) -> impl Iterator<Item = &Camera> {
        self.cameras.iter()
    }

    /// Status view of every enrolled camera.
    pub fn status(&self) -> BTreeMap<CameraId, CameraStatus> {
        self.cameras
            .iter()
            .filter_map(|camera| {
                self.runtime.get(&camera.id).map(|state| {
                    (
                        camera.id,
                        CameraStatus {
                            is_alarmed: state.is_alarmed,
                            last_checked: state.last_checked,
                            consecutive_static: state.consecutive_static,
                            detection_class: camera.detection_class,
                        },
                    )
                })
            })
            .collect()
    }
}
