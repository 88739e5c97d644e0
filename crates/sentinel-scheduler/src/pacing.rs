//! Sampling cadence.
//!
//! A user's sampling window is split evenly across the active cameras, and
//! each camera turn is split evenly across its burst:
//!
//! ```text
//! camera_interval = max(MIN_CAMERA, floor(window / cameras))
//! frame_interval  = max(MIN_FRAME,  floor(camera_interval / frames_per_check))
//! ```

use std::time::Duration;

use sentinel_models::SamplingWindow;

/// Floor on the per-camera interval.
pub const MIN_CAMERA_INTERVAL_MS: u64 = 1_000;

/// Floor on the gap between frames of one burst.
pub const MIN_FRAME_INTERVAL_MS: u64 = 500;

/// Lower bounds applied to the computed intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingFloors {
    pub min_camera_interval_ms: u64,
    pub min_frame_interval_ms: u64,
}

impl Default for PacingFloors {
    fn default() -> Self {
        Self {
            min_camera_interval_ms: MIN_CAMERA_INTERVAL_MS,
            min_frame_interval_ms: MIN_FRAME_INTERVAL_MS,
        }
    }
}

/// Milliseconds between camera turns for `cameras` enrolled cameras.
///
/// An empty set is paced as a single camera.
pub fn camera_interval_ms(window_ms: u64, cameras: usize, floor_ms: u64) -> u64 {
    let n = cameras.max(1) as u64;
    (window_ms / n).max(floor_ms)
}

/// Milliseconds between frames inside one burst.
pub fn frame_interval_ms(camera_interval_ms: u64, frames_per_check: u32, floor_ms: u64) -> u64 {
    let frames = u64::from(frames_per_check.max(1));
    (camera_interval_ms / frames).max(floor_ms)
}

/// Intervals in effect for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub camera_interval: Duration,
    pub frame_interval: Duration,
}

impl Pacing {
    pub fn compute(
        window: SamplingWindow,
        cameras: usize,
        frames_per_check: u32,
        floors: &PacingFloors,
    ) -> Self {
        let camera_ms = camera_interval_ms(window.as_millis(), cameras, floors.min_camera_interval_ms);
        let frame_ms = frame_interval_ms(camera_ms, frames_per_check, floors.min_frame_interval_ms);
        Self {
            camera_interval: Duration::from_millis(camera_ms),
            frame_interval: Duration::from_millis(frame_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_camera_thirty_seconds() {
        let p = Pacing::compute(SamplingWindow::Seconds30, 1, 3, &PacingFloors::default());
        assert_eq!(p.camera_interval, Duration::from_millis(30_000));
        assert_eq!(p.frame_interval, Duration::from_millis(10_000));
    }

    #[test]
    fn test_three_cameras_thirty_seconds() {
        let p = Pacing::compute(SamplingWindow::Seconds30, 3, 3, &PacingFloors::default());
        assert_eq!(p.camera_interval, Duration::from_millis(10_000));
        assert_eq!(p.frame_interval, Duration::from_millis(3_333));
    }

    #[test]
    fn test_floors_bound_large_fleets() {
        assert_eq!(camera_interval_ms(10_000, 50, MIN_CAMERA_INTERVAL_MS), 1_000);
        assert_eq!(frame_interval_ms(1_000, 3, MIN_FRAME_INTERVAL_MS), 500);
        assert_eq!(frame_interval_ms(1_000, 0, MIN_FRAME_INTERVAL_MS), 1_000);
    }

    #[test]
    fn test_empty_set_paced_as_one() {
        assert_eq!(camera_interval_ms(30_000, 0, MIN_CAMERA_INTERVAL_MS), 30_000);
    }

    #[test]
    fn test_camera_interval_matches_formula_and_is_non_increasing() {
        for window in SamplingWindow::ALL {
            let w = window.as_millis();
            let mut previous = u64::MAX;
            for n in 1..=200usize {
                let interval = camera_interval_ms(w, n, MIN_CAMERA_INTERVAL_MS);
                assert_eq!(interval, (w / n as u64).max(MIN_CAMERA_INTERVAL_MS));
                assert!(interval <= previous, "window {window} n {n}");
                previous = interval;
            }
        }
    }
}
