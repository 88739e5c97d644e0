//! Confirmed threat alerts.
//!
//! An alert is handed to the external dispatcher and never persisted here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BoundingBox, CameraId, DetectionClass, VerificationSummary};

/// A confirmed threat, ready for evidence upload and notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub user_id: String,
    pub camera_id: CameraId,
    pub camera_name: String,
    pub detection_class: DetectionClass,
    /// Label reported by the model (e.g. `smoke`, `knife`)
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
    /// JPEG bytes of the frame that confirmed the threat
    pub evidence_image_bytes: Vec<u8>,
    pub verification: VerificationSummary,
    pub detected_at: DateTime<Utc>,
}

impl Alert {
    /// Size of the evidence image, for logging without dumping bytes.
    pub fn evidence_len(&self) -> usize {
        self.evidence_image_bytes.len()
    }
}
