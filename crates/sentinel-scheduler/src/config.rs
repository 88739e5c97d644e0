//! Scheduler configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use sentinel_models::{
    Camera, DetectionClass, SamplingWindow, UserSettings, VerificationThresholds, DEFAULT_FRAMES_PER_CHECK,
    MAX_FRAMES_PER_CHECK,
};
use sentinel_vision::VisionConfig;

use crate::error::SchedulerResult;
use crate::pacing::{PacingFloors, MIN_CAMERA_INTERVAL_MS, MIN_FRAME_INTERVAL_MS};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Settings for users with no explicit overrides
    pub default_settings: UserSettings,
    /// Interval floors
    pub floors: PacingFloors,
    /// Model files and capture behaviour
    pub vision: VisionConfig,
    /// Prometheus listener port; no exporter when unset
    pub metrics_port: Option<u16>,
    /// JSON file with camera enrollment copies
    pub cameras_file: Option<PathBuf>,
    /// Capacity of the alert hand-off channel
    pub alert_buffer: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_settings: UserSettings::default(),
            floors: PacingFloors::default(),
            vision: VisionConfig::default(),
            metrics_port: None,
            cameras_file: None,
            alert_buffer: 64,
        }
    }
}

impl SchedulerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let vision = VisionConfig::from_env();
        let defaults = ThresholdDefaults::from_vision(&vision);

        let thresholds = VerificationThresholds {
            fire_confidence: defaults.fire,
            weapon_confidence: defaults.weapon,
            theft_confidence: defaults.theft,
            static_iou: env_or("SENTINEL_STATIC_IOU", 0.8),
            depth_std: env_or("SENTINEL_DEPTH_STD", 0.03),
            flicker_pixel_delta: env_or("SENTINEL_FLICKER_PIXEL_DELTA", 25),
            flicker_ratio: env_or("SENTINEL_FLICKER_RATIO", 0.02),
        };

        Self {
            default_settings: UserSettings {
                sampling_window: env_or("SENTINEL_SAMPLING_WINDOW", SamplingWindow::default()),
                frames_per_check: env_or("SENTINEL_FRAMES_PER_CHECK", DEFAULT_FRAMES_PER_CHECK)
                    .clamp(1, MAX_FRAMES_PER_CHECK),
                thresholds,
            },
            floors: PacingFloors {
                min_camera_interval_ms: env_or(
                    "SENTINEL_MIN_CAMERA_INTERVAL_MS",
                    MIN_CAMERA_INTERVAL_MS,
                ),
                min_frame_interval_ms: env_or(
                    "SENTINEL_MIN_FRAME_INTERVAL_MS",
                    MIN_FRAME_INTERVAL_MS,
                ),
            },
            vision,
            metrics_port: std::env::var("SENTINEL_METRICS_PORT")
                .ok()
                .and_then(|s| s.parse().ok()),
            cameras_file: std::env::var("SENTINEL_CAMERAS_FILE").ok().map(PathBuf::from),
            alert_buffer: env_or("SENTINEL_ALERT_BUFFER", 64usize).max(1),
        }
    }
}

/// Per-class confidence defaults taken from the detector configuration.
struct ThresholdDefaults {
    fire: f32,
    weapon: f32,
    theft: f32,
}

impl ThresholdDefaults {
    fn from_vision(vision: &VisionConfig) -> Self {
        Self {
            fire: vision.detector(DetectionClass::FireSmoke).confidence_threshold,
            weapon: vision.detector(DetectionClass::Weapon).confidence_threshold,
            theft: vision.detector(DetectionClass::Theft).confidence_threshold,
        }
    }
}

/// Read enrollment copies from a JSON array of camera records.
pub fn load_cameras(path: &Path) -> SchedulerResult<Vec<Camera>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.default_settings.sampling_window, SamplingWindow::Seconds30);
        assert_eq!(config.default_settings.frames_per_check, 3);
        assert_eq!(config.floors.min_camera_interval_ms, 1_000);
        assert_eq!(config.floors.min_frame_interval_ms, 500);
        assert!(config.metrics_port.is_none());
    }

    #[test]
    fn test_load_cameras() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cameras.json");
        std::fs::write(
            &path,
            r#"[
                {"id": 1, "userId": "u1", "address": "10.0.0.5", "detectionClass": "weapon"},
                {"id": 2, "userId": "u1", "streamUrl": "rtsp://nvr/2", "detectionClass": "fire_smoke", "active": false}
            ]"#,
        )
        .unwrap();

        let cameras = load_cameras(&path).unwrap();
        assert_eq!(cameras.len(), 2);
        assert_eq!(cameras[0].detection_class, DetectionClass::Weapon);
        assert!(cameras[0].active);
        assert!(!cameras[1].active);
        assert!(load_cameras(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        assert_eq!(env_or("SENTINEL_TEST_UNSET_VARIABLE", 7u32), 7);
    }
}
