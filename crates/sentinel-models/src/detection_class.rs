//! Detection class definitions.
//!
//! Each enrolled camera is watched by exactly one detection model:
//!
//! - `FireSmoke`: fire and smoke, verified live by temporal flicker
//! - `Weapon`: firearms and blades, verified live by depth variance
//! - `Theft`: theft-type actions, verified live by depth variance

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Detection class selector for a camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DetectionClass {
    /// Fire and smoke.
    FireSmoke,
    /// Handheld weapons.
    Weapon,
    /// Theft-type actions (shoplifting, snatching).
    Theft,
}

/// How a detection is checked for being a real, physical event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LivenessMethod {
    /// Monocular depth variance inside the box.
    Depth,
    /// Two-step intensity flicker across consecutive frames.
    Flicker,
}

impl DetectionClass {
    /// All detection classes.
    pub const ALL: &'static [DetectionClass] = &[
        DetectionClass::FireSmoke,
        DetectionClass::Weapon,
        DetectionClass::Theft,
    ];

    /// Returns the class name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionClass::FireSmoke => "fire_smoke",
            DetectionClass::Weapon => "weapon",
            DetectionClass::Theft => "theft",
        }
    }

    /// Default minimum confidence for a candidate box.
    ///
    /// Tuned high so the fleet errs toward fewer false alarms.
    pub fn default_confidence_threshold(&self) -> f32 {
        match self {
            DetectionClass::FireSmoke => 0.85,
            DetectionClass::Weapon => 0.65,
            DetectionClass::Theft => 0.5,
        }
    }

    /// Default class labels emitted by the model for this class.
    pub fn default_labels(&self) -> &'static [&'static str] {
        match self {
            DetectionClass::FireSmoke => &["fire", "smoke"],
            DetectionClass::Weapon => &["gun", "knife"],
            DetectionClass::Theft => &["theft"],
        }
    }

    /// Liveness check applied after motion verification.
    pub fn liveness_method(&self) -> LivenessMethod {
        match self {
            DetectionClass::FireSmoke => LivenessMethod::Flicker,
            DetectionClass::Weapon | DetectionClass::Theft => LivenessMethod::Depth,
        }
    }
}

impl fmt::Display for DetectionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DetectionClass {
    type Err = DetectionClassParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fire_smoke" | "fire" | "smoke" => Ok(DetectionClass::FireSmoke),
            "weapon" | "weapons" => Ok(DetectionClass::Weapon),
            "theft" | "theft_action" => Ok(DetectionClass::Theft),
            _ => Err(DetectionClassParseError(s.to_string())),
        }
    }
}

impl LivenessMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LivenessMethod::Depth => "depth",
            LivenessMethod::Flicker => "flicker",
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown detection class: {0}")]
pub struct DetectionClassParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_parse() {
        assert_eq!("fire".parse::<DetectionClass>().unwrap(), DetectionClass::FireSmoke);
        assert_eq!("fire_smoke".parse::<DetectionClass>().unwrap(), DetectionClass::FireSmoke);
        assert_eq!("Weapon".parse::<DetectionClass>().unwrap(), DetectionClass::Weapon);
        assert_eq!("theft".parse::<DetectionClass>().unwrap(), DetectionClass::Theft);
        assert!("pickpocket".parse::<DetectionClass>().is_err());
    }

    #[test]
    fn test_liveness_method() {
        assert_eq!(DetectionClass::FireSmoke.liveness_method(), LivenessMethod::Flicker);
        assert_eq!(DetectionClass::Weapon.liveness_method(), LivenessMethod::Depth);
        assert_eq!(DetectionClass::Theft.liveness_method(), LivenessMethod::Depth);
    }

    #[test]
    fn test_thresholds_bias_against_false_alarms() {
        let fire = DetectionClass::FireSmoke.default_confidence_threshold();
        let weapon = DetectionClass::Weapon.default_confidence_threshold();
        let theft = DetectionClass::Theft.default_confidence_threshold();
        assert!(fire > weapon && weapon > theft);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&DetectionClass::FireSmoke).unwrap();
        assert_eq!(json, "\"fire_smoke\"");
    }
}
