//! Verification verdicts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::LivenessMethod;

/// Motion verifier outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MotionVerdict {
    pub is_static: bool,
    /// Average IoU across consecutive fired frames
    pub metric: f32,
    /// Fired frames that contributed a box
    pub frames_considered: usize,
}

/// Liveness verifier outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LivenessVerdict {
    pub is_live: bool,
    /// Depth standard deviation or flicker ratio, depending on method
    pub metric: f32,
    pub method: LivenessMethod,
    /// True when the verdict came from a fail-open policy, not a measurement
    #[serde(default)]
    pub fail_open: bool,
}

/// Both verdicts attached to an alert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VerificationSummary {
    pub motion: MotionVerdict,
    pub liveness: LivenessVerdict,
}
