//! Lazily loaded, process-wide model handles.
//!
//! Each model loads on first use. A failed load is cached and reported once;
//! later lookups return the cached error without touching the filesystem.

use std::fmt;
use std::sync::{Arc, OnceLock};

use sentinel_models::DetectionClass;
use tracing::{error, info};

use crate::config::VisionConfig;
use crate::depth::{DepthEstimator, OnnxDepthEstimator};
use crate::detector::{OnnxThreatDetector, ThreatDetector};
use crate::error::{VisionError, VisionResult};

type Loader<T> = Box<dyn Fn() -> VisionResult<Arc<T>> + Send + Sync>;

/// A model that is loaded at most once.
pub struct ModelHandle<T: ?Sized> {
    name: String,
    cell: OnceLock<Result<Arc<T>, String>>,
    loader: Loader<T>,
}

impl<T: ?Sized> ModelHandle<T> {
    pub fn new(
        name: impl Into<String>,
        loader: impl Fn() -> VisionResult<Arc<T>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            cell: OnceLock::new(),
            loader: Box::new(loader),
        }
    }

    /// Handle that is already loaded.
    pub fn ready(name: impl Into<String>, model: Arc<T>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(model));
        Self {
            name: name.into(),
            cell,
            loader: Box::new(|| Err(VisionError::inference_failed("model already loaded"))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the model, loading it on first call.
    pub fn get(&self) -> VisionResult<Arc<T>> {
        self.cell
            .get_or_init(|| match (self.loader)() {
                Ok(model) => {
                    info!(model = %self.name, "Model loaded");
                    Ok(model)
                }
                Err(e) => {
                    error!(model = %self.name, error = %e, "Model failed to load");
                    Err(e.to_string())
                }
            })
            .clone()
            .map_err(|reason| VisionError::model_unavailable(&self.name, reason))
    }

    /// Whether a load was attempted and succeeded.
    pub fn is_loaded(&self) -> bool {
        matches!(self.cell.get(), Some(Ok(_)))
    }
}

impl<T: ?Sized> fmt::Debug for ModelHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.cell.get() {
            None => "pending",
            Some(Ok(_)) => "loaded",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("ModelHandle")
            .field("name", &self.name)
            .field("state", &state)
            .finish()
    }
}

/// One detector per class plus the shared depth estimator.
#[derive(Debug)]
pub struct ModelRegistry {
    fire_smoke: ModelHandle<dyn ThreatDetector>,
    weapon: ModelHandle<dyn ThreatDetector>,
    theft: ModelHandle<dyn ThreatDetector>,
    depth: ModelHandle<dyn DepthEstimator>,
}

impl ModelRegistry {
    /// Registry whose models load from the configured ONNX files on first use.
    pub fn from_config(config: &VisionConfig) -> Self {
        let detector_handle = |class: DetectionClass| {
            let cfg = config.detector(class).clone();
            ModelHandle::new(class.as_str(), move || {
                let detector: Arc<dyn ThreatDetector> =
                    Arc::new(OnnxThreatDetector::new(cfg.clone())?);
                Ok(detector)
            })
        };
        let depth_cfg = config.depth.clone();

        Self {
            fire_smoke: detector_handle(DetectionClass::FireSmoke),
            weapon: detector_handle(DetectionClass::Weapon),
            theft: detector_handle(DetectionClass::Theft),
            depth: ModelHandle::new("depth", move || {
                let estimator: Arc<dyn DepthEstimator> =
                    Arc::new(OnnxDepthEstimator::new(depth_cfg.clone())?);
                Ok(estimator)
            }),
        }
    }

    /// Registry with no models; every lookup reports the model as unavailable.
    pub fn empty() -> Self {
        let missing = |name: &'static str| {
            move || -> VisionResult<Arc<dyn ThreatDetector>> {
                Err(VisionError::model_not_found(name))
            }
        };
        Self {
            fire_smoke: ModelHandle::new("fire_smoke", missing("fire_smoke")),
            weapon: ModelHandle::new("weapon", missing("weapon")),
            theft: ModelHandle::new("theft", missing("theft")),
            depth: ModelHandle::new("depth", || -> VisionResult<Arc<dyn DepthEstimator>> {
                Err(VisionError::model_not_found("depth"))
            }),
        }
    }

    /// Replace the detector for a class with an already-built one.
    pub fn with_detector(mut self, class: DetectionClass, detector: Arc<dyn ThreatDetector>) -> Self {
        let handle = ModelHandle::ready(class.as_str(), detector);
        match class {
            DetectionClass::FireSmoke => self.fire_smoke = handle,
            DetectionClass::Weapon => self.weapon = handle,
            DetectionClass::Theft => self.theft = handle,
        }
        self
    }

    /// Replace the depth estimator with an already-built one.
    pub fn with_depth(mut self, estimator: Arc<dyn DepthEstimator>) -> Self {
        self.depth = ModelHandle::ready("depth", estimator);
        self
    }

    pub fn detector(&self, class: DetectionClass) -> VisionResult<Arc<dyn ThreatDetector>> {
        match class {
            DetectionClass::FireSmoke => self.fire_smoke.get(),
            DetectionClass::Weapon => self.weapon.get(),
            DetectionClass::Theft => self.theft.get(),
        }
    }

    pub fn depth(&self) -> VisionResult<Arc<dyn DepthEstimator>> {
        self.depth.get()
    }
}
