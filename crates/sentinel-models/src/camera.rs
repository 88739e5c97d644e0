//! Camera enrollment records.
//!
//! The authoritative camera record lives in an external store keyed by owner
//! id and numeric camera id. The scheduler only keeps an enrollment copy of
//! the fields it needs to build a decodable source URL.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

use crate::DetectionClass;

/// Default RTSP port used when an address carries none.
pub const DEFAULT_RTSP_PORT: u16 = 554;

/// Numeric camera identifier from the external record store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct CameraId(pub i64);

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CameraId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// How to reach a camera: direct address + credentials, or a pre-built URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDescriptor {
    /// Host or IP, optionally with a scheme (`rtsp://host`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Path on the device, e.g. `stream1` or `/Streaming/Channels/101`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_path: Option<String>,
    /// Pre-resolved stream URL, used only when no address is present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
}

/// Enrollment copy of a camera record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub id: CameraId,
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub connection: ConnectionDescriptor,
    pub detection_class: DetectionClass,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Errors that make a camera record unusable for enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraConfigError {
    #[error("camera {0} has neither an address nor a stream URL")]
    NoSource(CameraId),

    #[error("camera {camera_id} has an invalid source address: {reason}")]
    InvalidAddress { camera_id: CameraId, reason: String },
}

impl Camera {
    /// Create a camera reachable through a direct address.
    pub fn new(
        id: impl Into<CameraId>,
        user_id: impl Into<String>,
        address: impl Into<String>,
        detection_class: DetectionClass,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            name: String::new(),
            connection: ConnectionDescriptor {
                address: Some(address.into()),
                ..Default::default()
            },
            detection_class,
            active: true,
        }
    }

    /// Display name, falling back to the numeric id.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("camera-{}", self.id)
        } else {
            self.name.clone()
        }
    }

    /// Build the URL the frame source decodes from.
    ///
    /// Direct address + credentials win over a pre-resolved stream URL.
    pub fn source_url(&self) -> Result<String, CameraConfigError> {
        let conn = &self.connection;

        if let Some(address) = conn.address.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            return self.build_direct_url(address);
        }

        match conn.stream_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url.to_string()),
            _ => Err(CameraConfigError::NoSource(self.id)),
        }
    }

    fn build_direct_url(&self, address: &str) -> Result<String, CameraConfigError> {
        let conn = &self.connection;
        let invalid = |reason: &str| CameraConfigError::InvalidAddress {
            camera_id: self.id,
            reason: reason.to_string(),
        };

        let raw = if address.contains("://") {
            address.to_string()
        } else {
            format!("rtsp://{address}")
        };

        let mut url = Url::parse(&raw).map_err(|e| invalid(&e.to_string()))?;
        if url.host_str().is_none() {
            return Err(invalid("missing host"));
        }

        if let Some(port) = conn.port {
            url.set_port(Some(port)).map_err(|_| invalid("cannot set port"))?;
        } else if url.scheme() == "rtsp" && url.port().is_none() {
            url.set_port(Some(DEFAULT_RTSP_PORT))
                .map_err(|_| invalid("cannot set port"))?;
        }

        if let Some(user) = conn.username.as_deref().filter(|u| !u.is_empty()) {
            url.set_username(user)
                .map_err(|_| invalid("cannot set username"))?;
            if let Some(pass) = conn.password.as_deref().filter(|p| !p.is_empty()) {
                url.set_password(Some(pass))
                    .map_err(|_| invalid("cannot set password"))?;
            }
        }

        if let Some(path) = conn.stream_path.as_deref().filter(|p| !p.is_empty()) {
            url.set_path(path);
        }

        Ok(url.to_string())
    }
}
