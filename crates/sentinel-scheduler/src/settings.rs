//! Per-user runtime settings.

use std::collections::HashMap;
use std::sync::RwLock;

use sentinel_models::{SamplingWindow, UserSettings, VerificationThresholds, MAX_FRAMES_PER_CHECK};
use tracing::info;

use crate::error::{SchedulerError, SchedulerResult};

/// Settings keyed by owning user id, with a fallback for unknown users.
///
/// Reads copy the settings out, so a turn keeps the values it started with
/// even if they change mid-turn.
#[derive(Debug)]
pub struct SettingsStore {
    defaults: UserSettings,
    users: RwLock<HashMap<String, UserSettings>>,
}

impl SettingsStore {
    pub fn new(defaults: UserSettings) -> Self {
        Self {
            defaults,
            users: RwLock::new(HashMap::new()),
        }
    }

    pub fn defaults(&self) -> UserSettings {
        self.defaults
    }

    /// Settings for `user_id`, or the defaults.
    pub fn get(&self, user_id: &str) -> UserSettings {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        users.get(user_id).copied().unwrap_or(self.defaults)
    }

    /// Replace all settings for a user.
    pub fn set(&self, user_id: &str, settings: UserSettings) -> SchedulerResult<()> {
        validate_frames(settings.frames_per_check)?;
        self.update(user_id, |s| *s = settings);
        Ok(())
    }

    pub fn set_sampling_window(&self, user_id: &str, window: SamplingWindow) {
        self.update(user_id, |s| s.sampling_window = window);
        info!(user_id, window = %window, "Sampling window updated");
    }

    pub fn set_frames_per_check(&self, user_id: &str, frames: u32) -> SchedulerResult<()> {
        validate_frames(frames)?;
        self.update(user_id, |s| s.frames_per_check = frames);
        info!(user_id, frames, "Frames per check updated");
        Ok(())
    }

    pub fn set_thresholds(&self, user_id: &str, thresholds: VerificationThresholds) {
        self.update(user_id, |s| s.thresholds = thresholds);
        info!(user_id, "Verification thresholds updated");
    }

    fn update(&self, user_id: &str, apply: impl FnOnce(&mut UserSettings)) {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        let entry = users.entry(user_id.to_string()).or_insert(self.defaults);
        apply(entry);
    }
}

fn validate_frames(frames: u32) -> SchedulerResult<()> {
    if frames == 0 || frames > MAX_FRAMES_PER_CHECK {
        return Err(SchedulerError::invalid_setting(format!(
            "frames per check must be within 1..={MAX_FRAMES_PER_CHECK}, got {frames}"
        )));
    }
    Ok(())
}
