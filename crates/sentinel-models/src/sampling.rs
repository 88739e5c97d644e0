//! Sampling windows.
//!
//! A sampling window is the time budget within which every enrolled camera
//! should be examined at least once. It is chosen from a small fixed set.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// User-selectable sampling window.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema, Default,
)]
pub enum SamplingWindow {
    #[serde(rename = "10s")]
    Seconds10,
    #[serde(rename = "20s")]
    Seconds20,
    #[default]
    #[serde(rename = "30s")]
    Seconds30,
    #[serde(rename = "1m")]
    Minutes1,
    #[serde(rename = "2m")]
    Minutes2,
    #[serde(rename = "5m")]
    Minutes5,
    #[serde(rename = "10m")]
    Minutes10,
}

impl SamplingWindow {
    /// All windows, shortest first.
    pub const ALL: &'static [SamplingWindow] = &[
        SamplingWindow::Seconds10,
        SamplingWindow::Seconds20,
        SamplingWindow::Seconds30,
        SamplingWindow::Minutes1,
        SamplingWindow::Minutes2,
        SamplingWindow::Minutes5,
        SamplingWindow::Minutes10,
    ];

    pub fn as_millis(&self) -> u64 {
        match self {
            SamplingWindow::Seconds10 => 10_000,
            SamplingWindow::Seconds20 => 20_000,
            SamplingWindow::Seconds30 => 30_000,
            SamplingWindow::Minutes1 => 60_000,
            SamplingWindow::Minutes2 => 120_000,
            SamplingWindow::Minutes5 => 300_000,
            SamplingWindow::Minutes10 => 600_000,
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.as_millis())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingWindow::Seconds10 => "10s",
            SamplingWindow::Seconds20 => "20s",
            SamplingWindow::Seconds30 => "30s",
            SamplingWindow::Minutes1 => "1m",
            SamplingWindow::Minutes2 => "2m",
            SamplingWindow::Minutes5 => "5m",
            SamplingWindow::Minutes10 => "10m",
        }
    }

    /// Look up the window whose length is exactly `millis`.
    pub fn from_millis(millis: u64) -> Option<Self> {
        Self::ALL.iter().copied().find(|w| w.as_millis() == millis)
    }
}

impl fmt::Display for SamplingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SamplingWindow {
    type Err = SamplingWindowParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_lowercase();
        if let Some(window) = Self::ALL.iter().find(|w| w.as_str() == trimmed) {
            return Ok(*window);
        }

        trimmed
            .parse::<u64>()
            .ok()
            .and_then(Self::from_millis)
            .ok_or_else(|| SamplingWindowParseError(s.to_string()))
    }
}

impl TryFrom<u64> for SamplingWindow {
    type Error = SamplingWindowParseError;

    fn try_from(millis: u64) -> Result<Self, Self::Error> {
        Self::from_millis(millis).ok_or_else(|| SamplingWindowParseError(millis.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("Unsupported sampling window: {0} (expected one of 10s, 20s, 30s, 1m, 2m, 5m, 10m)")]
pub struct SamplingWindowParseError(String);
