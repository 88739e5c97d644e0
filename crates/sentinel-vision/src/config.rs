//! Vision configuration: model files and capture settings.

use std::path::PathBuf;
use std::time::Duration;

use sentinel_models::DetectionClass;

use crate::depth::DepthConfig;
use crate::detector::DetectorConfig;

/// Model locations and capture behaviour.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Directory holding the ONNX model files
    pub model_dir: PathBuf,
    pub fire_smoke: DetectorConfig,
    pub weapon: DetectorConfig,
    pub theft: DetectorConfig,
    pub depth: DepthConfig,
    /// Per-frame capture timeout
    pub capture_timeout: Duration,
    /// RTSP transport passed to ffmpeg (`tcp` or `udp`)
    pub rtsp_transport: String,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self::with_model_dir("models")
    }
}

impl VisionConfig {
    /// Default configuration rooted at `model_dir`.
    pub fn with_model_dir(model_dir: impl Into<PathBuf>) -> Self {
        let model_dir = model_dir.into();
        Self {
            fire_smoke: DetectorConfig::for_class(DetectionClass::FireSmoke, &model_dir),
            weapon: DetectorConfig::for_class(DetectionClass::Weapon, &model_dir),
            theft: DetectorConfig::for_class(DetectionClass::Theft, &model_dir),
            depth: DepthConfig::in_dir(&model_dir),
            model_dir,
            capture_timeout: Duration::from_secs(10),
            rtsp_transport: "tcp".to_string(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let model_dir = std::env::var("SENTINEL_MODEL_DIR").unwrap_or_else(|_| "models".into());
        let mut config = Self::with_model_dir(&model_dir);

        for class in DetectionClass::ALL {
            let prefix = match class {
                DetectionClass::FireSmoke => "SENTINEL_FIRE",
                DetectionClass::Weapon => "SENTINEL_WEAPON",
                DetectionClass::Theft => "SENTINEL_THEFT",
            };
            let detector = config.detector_mut(*class);
            if let Ok(file) = std::env::var(format!("{prefix}_MODEL")) {
                detector.model_path = config_path(&model_dir, &file);
            }
            if let Some(conf) = env_parse(&format!("{prefix}_CONFIDENCE")) {
                detector.confidence_threshold = conf;
            }
            if let Ok(labels) = std::env::var(format!("{prefix}_LABELS")) {
                let parsed: Vec<String> = labels
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if !parsed.is_empty() {
                    detector.labels = parsed;
                }
            }
            if let Some(iou) = env_parse("SENTINEL_NMS_IOU") {
                detector.nms_threshold = iou;
            }
        }

        if let Ok(file) = std::env::var("SENTINEL_DEPTH_MODEL") {
            config.depth.model_path = config_path(&model_dir, &file);
        }
        if let Some(ms) = env_parse::<u64>("SENTINEL_CAPTURE_TIMEOUT_MS") {
            config.capture_timeout = Duration::from_millis(ms.max(1));
        }
        if let Ok(transport) = std::env::var("SENTINEL_RTSP_TRANSPORT") {
            config.rtsp_transport = transport;
        }

        config
    }

    pub fn detector(&self, class: DetectionClass) -> &DetectorConfig {
        match class {
            DetectionClass::FireSmoke => &self.fire_smoke,
            DetectionClass::Weapon => &self.weapon,
            DetectionClass::Theft => &self.theft,
        }
    }

    fn detector_mut(&mut self, class: DetectionClass) -> &mut DetectorConfig {
        match class {
            DetectionClass::FireSmoke => &mut self.fire_smoke,
            DetectionClass::Weapon => &mut self.weapon,
            DetectionClass::Theft => &mut self.theft,
        }
    }
}

/// Absolute paths are used as-is; bare names resolve under the model dir.
fn config_path(model_dir: &str, file: &str) -> PathBuf {
    let path = PathBuf::from(file);
    if path.is_absolute() {
        path
    } else {
        PathBuf::from(model_dir).join(path)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
