//! Camera rotation scheduler.
//!
//! Owns the active camera set and drives one turn at a time:
//!
//! ```text
//! Idle --start()--> Running --set empties--> Idle --enroll()--> Running
//!   \                  |
//!    \--stop()--> Stopped <--stop()
//! ```
//!
//! Each turn arms the delay before the next one when it finishes, so turns
//! never overlap regardless of inference latency. Enrollment and removal may
//! happen while a turn is in flight; they change pacing from the next tick.
//! Stopping is cooperative and observed only between turns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use sentinel_models::{
    Camera, CameraId, SamplingWindow, SchedulerState, SchedulerStatus, UserSettings,
    VerificationThresholds,
};
use sentinel_vision::{FrameSource, ModelRegistry};
use tokio::sync::Notify;
use tracing::{debug, info, warn, Instrument};

use crate::clock::Clock;
use crate::dispatcher::AlertDispatcher;
use crate::error::{SchedulerError, SchedulerResult};
use crate::logging;
use crate::metrics;
use crate::pacing::{Pacing, PacingFloors};
use crate::roster::Roster;
use crate::settings::SettingsStore;
use crate::turn::{run_turn, TurnContext, TurnOutcome, TurnReport};

/// Loop lifecycle, guarded separately from the roster.
#[derive(Debug, Default)]
struct Lifecycle {
    state: SchedulerState,
    /// Set by `start()`; enrollment restarts an idle loop only once started
    started: bool,
    /// Bumped for every spawned loop; stale loops exit at their next boundary
    generation: u64,
    /// Wakes the current loop out of its inter-turn sleep
    wake: Arc<Notify>,
}

struct Inner {
    ctx: TurnContext,
    dispatcher: Arc<dyn AlertDispatcher>,
    settings: SettingsStore,
    floors: PacingFloors,
    roster: Mutex<Roster>,
    lifecycle: Mutex<Lifecycle>,
    /// Serializes turns between the loop and `tick()`
    turn_lock: tokio::sync::Mutex<()>,
    turns: AtomicU64,
}

/// Round-robin camera scheduler. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CameraScheduler {
    inner: Arc<Inner>,
}

/// Builder for [`CameraScheduler`].
pub struct SchedulerBuilder {
    frame_source: Arc<dyn FrameSource>,
    models: Arc<ModelRegistry>,
    dispatcher: Arc<dyn AlertDispatcher>,
    clock: Arc<dyn Clock>,
    defaults: UserSettings,
    floors: PacingFloors,
}

impl SchedulerBuilder {
    pub fn new(
        frame_source: Arc<dyn FrameSource>,
        models: Arc<ModelRegistry>,
        dispatcher: Arc<dyn AlertDispatcher>,
    ) -> Self {
        Self {
            frame_source,
            models,
            dispatcher,
            clock: Arc::new(crate::clock::TokioClock),
            defaults: UserSettings::default(),
            floors: PacingFloors::default(),
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn default_settings(mut self, defaults: UserSettings) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn floors(mut self, floors: PacingFloors) -> Self {
        self.floors = floors;
        self
    }

    pub fn build(self) -> CameraScheduler {
        CameraScheduler {
            inner: Arc::new(Inner {
                ctx: TurnContext {
                    frame_source: self.frame_source,
                    models: self.models,
                    clock: self.clock,
                },
                dispatcher: self.dispatcher,
                settings: SettingsStore::new(self.defaults),
                floors: self.floors,
                roster: Mutex::new(Roster::new()),
                lifecycle: Mutex::new(Lifecycle::default()),
                turn_lock: tokio::sync::Mutex::new(()),
                turns: AtomicU64::new(0),
            }),
        }
    }
}

impl CameraScheduler {
    pub fn builder(
        frame_source: Arc<dyn FrameSource>,
        models: Arc<ModelRegistry>,
        dispatcher: Arc<dyn AlertDispatcher>,
    ) -> SchedulerBuilder {
        SchedulerBuilder::new(frame_source, models, dispatcher)
    }

    /// Add a camera to the end of the rotation.
    ///
    /// The camera must be active and resolve to a source URL. If the
    /// scheduler was started and has gone idle, the loop restarts.
    pub fn enroll(&self, camera: Camera) -> SchedulerResult<()> {
        if !camera.active {
            return Err(SchedulerError::CameraInactive(camera.id));
        }
        camera.source_url()?;

        let (camera_id, user_id, class) = (camera.id, camera.user_id.clone(), camera.detection_class);
        let size = {
            let mut roster = self.inner.roster();
            roster.insert(camera)?;
            roster.len()
        };
        metrics::set_active_cameras(size);
        info!(camera_id = %camera_id, user_id = %user_id, class = %class, queue_size = size, "Camera enrolled");

        let restart = {
            let lifecycle = self.inner.lifecycle();
            lifecycle.started && lifecycle.state == SchedulerState::Idle
        };
        if restart {
            self.spawn_loop();
        }
        Ok(())
    }

    /// Remove a camera and its runtime state. Returns the enrollment copy.
    pub fn dequeue(&self, camera_id: CameraId) -> Option<Camera> {
        let (removed, size) = {
            let mut roster = self.inner.roster();
            let removed = roster.remove(camera_id);
            (removed, roster.len())
        };

        if removed.is_some() {
            metrics::set_active_cameras(size);
            info!(camera_id = %camera_id, queue_size = size, "Camera dequeued");
            if size == 0 {
                // Let a sleeping loop notice the empty set and go idle.
                self.inner.lifecycle().wake.notify_one();
            }
        }
        removed
    }

    /// Set a user's sampling window from milliseconds (must be a supported window).
    pub fn set_sampling_window(&self, user_id: &str, window_ms: u64) -> SchedulerResult<SamplingWindow> {
        let window = SamplingWindow::try_from(window_ms)?;
        self.inner.settings.set_sampling_window(user_id, window);
        Ok(window)
    }

    pub fn set_frames_per_check(&self, user_id: &str, frames: u32) -> SchedulerResult<()> {
        self.inner.settings.set_frames_per_check(user_id, frames)
    }

    pub fn set_thresholds(&self, user_id: &str, thresholds: VerificationThresholds) {
        self.inner.settings.set_thresholds(user_id, thresholds);
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.inner.settings
    }

    pub fn state(&self) -> SchedulerState {
        self.inner.lifecycle().state
    }

    pub fn status(&self) -> SchedulerStatus {
        let state = self.state();
        let roster = self.inner.roster();
        SchedulerStatus {
            running: state.is_running(),
            state,
            queue_size: roster.len(),
            per_camera: roster.status(),
        }
    }

    /// Start the rotation loop. No-op if already running.
    ///
    /// Clears a previous `stop()`. With an empty set the scheduler stays idle
    /// until the first enrollment. Must be called within a tokio runtime.
    pub fn start(&self) {
        {
            let mut lifecycle = self.inner.lifecycle();
            if lifecycle.state == SchedulerState::Running {
                return;
            }
            lifecycle.started = true;
            lifecycle.state = SchedulerState::Idle;
        }
        if !self.inner.roster().is_empty() {
            self.spawn_loop();
        } else {
            info!("Scheduler started with no cameras; waiting for enrollment");
        }
    }

    /// Stop scheduling new turns. A turn already running completes.
    pub fn stop(&self) {
        let mut lifecycle = self.inner.lifecycle();
        lifecycle.state = SchedulerState::Stopped;
        lifecycle.started = false;
        lifecycle.generation += 1;
        lifecycle.wake.notify_one();
        info!("Scheduler stopped");
    }

    /// Wait until no turn is in flight.
    ///
    /// After `stop()` this returns once the turn that was running completes.
    pub async fn wait_idle(&self) {
        let _turn = self.inner.turn_lock.lock().await;
    }

    /// Run exactly one turn now and report it. `None` when the set is empty.
    ///
    /// Waits for any in-flight turn first, so turns never overlap.
    pub async fn tick(&self) -> Option<TurnReport> {
        self.inner.run_one_turn().await
    }

    fn spawn_loop(&self) {
        let (generation, wake) = {
            let mut lifecycle = self.inner.lifecycle();
            if lifecycle.state != SchedulerState::Idle || !lifecycle.started {
                return;
            }
            lifecycle.generation += 1;
            lifecycle.state = SchedulerState::Running;
            lifecycle.wake = Arc::new(Notify::new());
            (lifecycle.generation, lifecycle.wake.clone())
        };

        info!(generation, "Scheduler loop starting");
        let inner = self.inner.clone();
        tokio::spawn(async move { inner.run_loop(generation, wake).await });
    }
}

impl Inner {
    fn roster(&self) -> MutexGuard<'_, Roster> {
        self.roster.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_current(&self, generation: u64) -> bool {
        let lifecycle = self.lifecycle();
        lifecycle.generation == generation && lifecycle.state == SchedulerState::Running
    }

    /// Go idle if this loop is current and the set is empty. Returns true if halted.
    fn halt_if_empty(&self, generation: u64) -> bool {
        let mut lifecycle = self.lifecycle();
        if lifecycle.generation != generation || lifecycle.state != SchedulerState::Running {
            return true;
        }
        if self.roster().is_empty() {
            lifecycle.state = SchedulerState::Idle;
            info!("Active set empty; scheduler idle");
            return true;
        }
        false
    }

    async fn run_loop(self: Arc<Self>, generation: u64, wake: Arc<Notify>) {
        loop {
            if !self.is_current(generation) {
                break;
            }

            let delay = match self.run_one_turn().await {
                Some(report) => report.next_delay,
                None => None,
            };

            let Some(delay) = delay else {
                if self.halt_if_empty(generation) {
                    break;
                }
                continue;
            };

            if !self.is_current(generation) {
                break;
            }

            debug!(delay_ms = delay.as_millis() as u64, "Next turn armed");
            let mut sleep = self.ctx.clock.sleep(delay);
            loop {
                tokio::select! {
                    _ = &mut sleep => break,
                    _ = wake.notified() => {
                        // A wake-up only cuts the delay short for a stop or an
                        // empty set; one left over from a refilled set is ignored.
                        if !self.is_current(generation) || self.roster().is_empty() {
                            break;
                        }
                    }
                }
            }
        }
        debug!(generation, "Scheduler loop exited");
    }

    async fn run_one_turn(&self) -> Option<TurnReport> {
        let _turn = self.turn_lock.lock().await;

        let (camera, set_size) = {
            let mut roster = self.roster();
            let camera = roster.advance()?;
            (camera, roster.len())
        };

        let turn = self.turns.fetch_add(1, Ordering::Relaxed) + 1;
        let settings = self.settings.get(&camera.user_id);
        let pacing = Pacing::compute(
            settings.sampling_window,
            set_size,
            settings.bounded_frames_per_check(),
            &self.floors,
        );

        debug!(
            turn,
            camera_id = %camera.id,
            class = %camera.detection_class,
            camera_interval_ms = pacing.camera_interval.as_millis() as u64,
            frame_interval_ms = pacing.frame_interval.as_millis() as u64,
            "Turn starting"
        );

        let started = Instant::now();
        let outcome = run_turn(&self.ctx, &camera, &settings, pacing.frame_interval)
            .instrument(logging::turn_span(turn, &camera))
            .await;
        let elapsed = started.elapsed();

        self.apply_outcome(&camera, &outcome);
        if let Some(alert) = outcome.alert() {
            self.dispatch(alert.clone());
        }

        let next_delay = self.next_delay();
        metrics::record_turn(camera.detection_class, outcome.as_str(), elapsed.as_secs_f64());

        Some(TurnReport {
            turn,
            camera,
            pacing,
            outcome,
            next_delay,
            elapsed,
        })
    }

    /// Update runtime state; skipped if the camera was dequeued mid-turn.
    fn apply_outcome(&self, camera: &Camera, outcome: &TurnOutcome) {
        let now = self.ctx.clock.now();
        let mut roster = self.roster();
        let Some(state) = roster.state_mut(camera.id) else {
            debug!(camera_id = %camera.id, "Camera left the set during its turn");
            return;
        };

        state.last_checked = Some(now);
        match outcome {
            TurnOutcome::Static { .. } => {
                state.consecutive_static = state.consecutive_static.saturating_add(1);
                state.is_alarmed = false;
            }
            TurnOutcome::Confirmed(_) => {
                state.consecutive_static = 0;
                state.is_alarmed = true;
            }
            TurnOutcome::NoFrames
            | TurnOutcome::NoDetection { .. }
            | TurnOutcome::Suppressed { .. } => {
                state.consecutive_static = 0;
                state.is_alarmed = false;
            }
        }
    }

    /// Delay before the next turn, paced for the next camera's owner and the
    /// current set size.
    fn next_delay(&self) -> Option<std::time::Duration> {
        let (user_id, size) = {
            let roster = self.roster();
            let next = roster.peek()?;
            (next.user_id.clone(), roster.len())
        };
        let settings = self.settings.get(&user_id);
        let pacing = Pacing::compute(
            settings.sampling_window,
            size,
            settings.bounded_frames_per_check(),
            &self.floors,
        );
        Some(pacing.camera_interval)
    }

    fn dispatch(&self, alert: sentinel_models::Alert) {
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            let alert_id = alert.id;
            let camera_id = alert.camera_id;
            if let Err(e) = dispatcher.dispatch(alert).await {
                warn!(alert_id = %alert_id, camera_id = %camera_id, error = %e, "Alert dispatch failed");
                metrics::record_dispatch_failure();
            }
        });
    }
}
