//! Adaptive camera threat-detection scheduler.
//!
//! Rotates through enrolled cameras one at a time. Each turn captures a short
//! frame burst, runs the camera's detection model on every frame and gates a
//! positive result through motion and liveness checks before handing a
//! confirmed [`Alert`](sentinel_models::Alert) to an [`AlertDispatcher`].
//!
//! Turn pacing adapts to the number of enrolled cameras so each one is
//! revisited roughly once per its owner's sampling window.

pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pacing;
pub mod roster;
pub mod scheduler;
pub mod settings;
pub mod turn;

pub use clock::{Clock, TokioClock};
pub use config::{load_cameras, SchedulerConfig};
pub use dispatcher::{AlertDispatcher, ChannelDispatcher, LogDispatcher};
pub use error::{SchedulerError, SchedulerResult};
pub use pacing::{
    camera_interval_ms, frame_interval_ms, Pacing, PacingFloors, MIN_CAMERA_INTERVAL_MS,
    MIN_FRAME_INTERVAL_MS,
};
pub use roster::{CameraRuntimeState, Roster};
pub use scheduler::{CameraScheduler, SchedulerBuilder};
pub use settings::SettingsStore;
pub use turn::{run_turn, TurnContext, TurnOutcome, TurnReport};
