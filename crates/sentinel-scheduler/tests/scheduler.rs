//! End-to-end scheduler behaviour with fake capture, models and clock.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use sentinel_models::{
    BoundingBox, Camera, CameraId, Detection, DetectionClass, LivenessMethod, SchedulerState,
    UserSettings,
};
use sentinel_scheduler::{
    CameraScheduler, ChannelDispatcher, Clock, LogDispatcher, TurnOutcome,
};
use sentinel_vision::{
    DepthEstimator, DepthMap, Frame, FrameSource, ModelRegistry, ThreatDetector, VisionError,
    VisionResult,
};

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;

fn jpeg_frame() -> Vec<u8> {
    encode_jpeg(DynamicImage::ImageRgb8(RgbImage::from_fn(WIDTH, HEIGHT, |x, y| {
        Rgb([(x * 4) as u8, (y * 5) as u8, 90])
    })))
}

fn solid_jpeg(level: u8) -> Vec<u8> {
    encode_jpeg(DynamicImage::ImageRgb8(RgbImage::from_pixel(
        WIDTH,
        HEIGHT,
        Rgb([level, level / 2, 0]),
    )))
}

fn encode_jpeg(image: DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Jpeg(90))
        .unwrap();
    bytes
}

type CaptureHook = Box<dyn FnOnce(&CameraScheduler) + Send>;

/// Serves the same JPEG for every camera and can act on the scheduler
/// during the first capture of a chosen camera.
#[derive(Default)]
struct StillSource {
    captures: Mutex<HashMap<CameraId, usize>>,
    scheduler: OnceLock<CameraScheduler>,
    hook: Mutex<Option<(CameraId, CaptureHook)>>,
}

impl StillSource {
    fn captures(&self, id: i64) -> usize {
        self.captures.lock().unwrap().get(&CameraId(id)).copied().unwrap_or(0)
    }

    fn attach(&self, scheduler: &CameraScheduler) {
        if self.scheduler.set(scheduler.clone()).is_err() {
            panic!("scheduler already attached");
        }
    }

    fn during_capture_of(&self, id: i64, hook: impl FnOnce(&CameraScheduler) + Send + 'static) {
        *self.hook.lock().unwrap() = Some((CameraId(id), Box::new(hook)));
    }
}

#[async_trait]
impl FrameSource for StillSource {
    async fn capture(&self, camera: &Camera) -> VisionResult<Frame> {
        *self.captures.lock().unwrap().entry(camera.id).or_default() += 1;

        let pending = {
            let mut hook = self.hook.lock().unwrap();
            match hook.as_ref() {
                Some((trigger, _)) if *trigger == camera.id => hook.take().map(|(_, h)| h),
                _ => None,
            }
        };
        if let (Some(hook), Some(scheduler)) = (pending, self.scheduler.get()) {
            hook(scheduler);
        }

        Ok(Frame::new(camera.id, Utc::now(), jpeg_frame()))
    }
}

/// Fails exactly one capture (zero-based call index), serves frames otherwise.
struct FlakySource {
    fail_call: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl FrameSource for FlakySource {
    async fn capture(&self, camera: &Camera) -> VisionResult<Frame> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_call {
            return Err(VisionError::CaptureTimeout(10_000));
        }
        Ok(Frame::new(camera.id, Utc::now(), jpeg_frame()))
    }
}

/// Whole frame alternates bright and dark, like flames.
#[derive(Default)]
struct FlickerSource {
    calls: AtomicUsize,
}

#[async_trait]
impl FrameSource for FlickerSource {
    async fn capture(&self, camera: &Camera) -> VisionResult<Frame> {
        let level = if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 { 250 } else { 40 };
        Ok(Frame::new(camera.id, Utc::now(), solid_jpeg(level)))
    }
}

/// Blocks inside capture until released.
#[derive(Default)]
struct GateSource {
    entered: tokio::sync::Notify,
    release: tokio::sync::Notify,
}

#[async_trait]
impl FrameSource for GateSource {
    async fn capture(&self, camera: &Camera) -> VisionResult<Frame> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(Frame::new(camera.id, Utc::now(), jpeg_frame()))
    }
}

struct OfflineSource;

#[async_trait]
impl FrameSource for OfflineSource {
    async fn capture(&self, _camera: &Camera) -> VisionResult<Frame> {
        Err(VisionError::capture_failed("connection refused", None))
    }
}

/// Returns one scripted box per call, cycling through the script.
struct ScriptedDetector {
    class: DetectionClass,
    label: &'static str,
    boxes: Vec<BoundingBox>,
    calls: AtomicUsize,
}

impl ScriptedDetector {
    fn new(class: DetectionClass, label: &'static str, boxes: Vec<BoundingBox>) -> Self {
        Self {
            class,
            label,
            boxes,
            calls: AtomicUsize::new(0),
        }
    }
}

impl ThreatDetector for ScriptedDetector {
    fn class(&self) -> DetectionClass {
        self.class
    }

    fn default_threshold(&self) -> f32 {
        0.5
    }

    fn detect(&self, _image: &DynamicImage, threshold: f32) -> VisionResult<Vec<Detection>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let bbox = self.boxes[call % self.boxes.len()];
        Ok(vec![Detection::new(self.label, 0.9, bbox)]
            .into_iter()
            .filter(|d| d.confidence >= threshold)
            .collect())
    }
}

/// Fails the first inference, then always reports the same box.
struct FailsOnceDetector {
    calls: AtomicUsize,
}

impl ThreatDetector for FailsOnceDetector {
    fn class(&self) -> DetectionClass {
        DetectionClass::Weapon
    }

    fn default_threshold(&self) -> f32 {
        0.5
    }

    fn detect(&self, _image: &DynamicImage, _threshold: f32) -> VisionResult<Vec<Detection>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(VisionError::inference_failed("execution provider error"));
        }
        Ok(vec![Detection::new("gun", 0.9, same_box()[0])])
    }
}

/// Depth estimator with either a flat or a checkerboard map.
struct FakeDepth {
    varied: bool,
}

impl DepthEstimator for FakeDepth {
    fn estimate(&self, image: &DynamicImage) -> VisionResult<DepthMap> {
        let raw = (0..48)
            .map(|i| if self.varied && i % 2 == 0 { 1.0 } else { 0.0 })
            .collect();
        DepthMap::from_raw(8, 6, raw, image.width(), image.height())
    }
}

/// Records requested sleeps and returns immediately.
#[derive(Default)]
struct RecordingClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    fn take(&self) -> Vec<Duration> {
        std::mem::take(&mut *self.sleeps.lock().unwrap())
    }
}

#[async_trait]
impl Clock for RecordingClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Sleeps never finish on their own; only a wake-up ends them.
struct ParkedClock;

#[async_trait]
impl Clock for ParkedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, _duration: Duration) {
        std::future::pending::<()>().await
    }
}

/// Records requested sleeps; the sleeps themselves never finish.
#[derive(Default)]
struct ParkedRecordingClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl ParkedRecordingClock {
    fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ParkedRecordingClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        std::future::pending::<()>().await
    }
}

fn single_frame() -> UserSettings {
    UserSettings {
        frames_per_check: 1,
        ..UserSettings::default()
    }
}

fn camera(id: i64, class: DetectionClass) -> Camera {
    Camera::new(id, "owner", format!("10.0.0.{id}"), class)
}

fn same_box() -> Vec<BoundingBox> {
    vec![BoundingBox::new(10.0, 10.0, 50.0, 50.0)]
}

fn drifting_boxes() -> Vec<BoundingBox> {
    vec![
        BoundingBox::new(0.0, 0.0, 20.0, 20.0),
        BoundingBox::new(15.0, 0.0, 35.0, 20.0),
        BoundingBox::new(30.0, 0.0, 50.0, 20.0),
    ]
}

async fn wait_for_state(scheduler: &CameraScheduler, state: SchedulerState) -> bool {
    for _ in 0..200 {
        if scheduler.state() == state {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn static_detection_never_alerts() {
    let registry = ModelRegistry::empty().with_detector(
        DetectionClass::Weapon,
        Arc::new(ScriptedDetector::new(DetectionClass::Weapon, "gun", same_box())),
    );
    let (dispatcher, mut alerts) = ChannelDispatcher::channel(4);
    let scheduler = CameraScheduler::builder(
        Arc::new(StillSource::default()),
        Arc::new(registry),
        Arc::new(dispatcher),
    )
    .clock(Arc::new(RecordingClock::default()))
    .build();
    scheduler.enroll(camera(1, DetectionClass::Weapon)).unwrap();

    let report = scheduler.tick().await.unwrap();
    match &report.outcome {
        TurnOutcome::Static { motion } => {
            assert!(motion.is_static);
            assert_eq!(motion.frames_considered, 3);
        }
        other => panic!("expected static outcome, got {other:?}"),
    }
    scheduler.tick().await.unwrap();

    let status = scheduler.status();
    let cam = &status.per_camera[&CameraId(1)];
    assert_eq!(cam.consecutive_static, 2);
    assert!(!cam.is_alarmed);

    tokio::task::yield_now().await;
    assert!(alerts.try_recv().is_err());
}

#[tokio::test]
async fn moving_live_detection_is_dispatched() {
    let registry = ModelRegistry::empty()
        .with_detector(
            DetectionClass::Weapon,
            Arc::new(ScriptedDetector::new(
                DetectionClass::Weapon,
                "knife",
                drifting_boxes(),
            )),
        )
        .with_depth(Arc::new(FakeDepth { varied: true }));
    let (dispatcher, mut alerts) = ChannelDispatcher::channel(4);
    let scheduler = CameraScheduler::builder(
        Arc::new(StillSource::default()),
        Arc::new(registry),
        Arc::new(dispatcher),
    )
    .clock(Arc::new(RecordingClock::default()))
    .build();
    scheduler.enroll(camera(5, DetectionClass::Weapon)).unwrap();

    let report = scheduler.tick().await.unwrap();
    assert!(report.outcome.is_confirmed());

    let alert = tokio::time::timeout(Duration::from_secs(5), alerts.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(alert.camera_id, CameraId(5));
    assert_eq!(alert.detection_class, DetectionClass::Weapon);
    assert_eq!(alert.label, "knife");
    assert_eq!(alert.bbox, BoundingBox::new(30.0, 0.0, 50.0, 20.0));
    assert!(!alert.evidence_image_bytes.is_empty());
    assert!(!alert.verification.motion.is_static);
    assert!(alert.verification.liveness.is_live);
    assert!(!alert.verification.liveness.fail_open);

    let status = scheduler.status();
    assert!(status.per_camera[&CameraId(5)].is_alarmed);
    assert_eq!(status.per_camera[&CameraId(5)].consecutive_static, 0);
}

#[tokio::test]
async fn flat_depth_suppresses_moving_detection() {
    let registry = ModelRegistry::empty()
        .with_detector(
            DetectionClass::Weapon,
            Arc::new(ScriptedDetector::new(
                DetectionClass::Weapon,
                "gun",
                drifting_boxes(),
            )),
        )
        .with_depth(Arc::new(FakeDepth { varied: false }));
    let (dispatcher, mut alerts) = ChannelDispatcher::channel(4);
    let scheduler = CameraScheduler::builder(
        Arc::new(StillSource::default()),
        Arc::new(registry),
        Arc::new(dispatcher),
    )
    .clock(Arc::new(RecordingClock::default()))
    .build();
    scheduler.enroll(camera(6, DetectionClass::Weapon)).unwrap();

    let report = scheduler.tick().await.unwrap();
    match &report.outcome {
        TurnOutcome::Suppressed { verification } => {
            assert!(!verification.motion.is_static);
            assert!(!verification.liveness.is_live);
        }
        other => panic!("expected suppressed outcome, got {other:?}"),
    }
    assert!(!scheduler.status().per_camera[&CameraId(6)].is_alarmed);

    tokio::task::yield_now().await;
    assert!(alerts.try_recv().is_err());
}

#[tokio::test]
async fn enrollment_mid_turn_applies_from_next_tick() {
    let source = Arc::new(StillSource::default());
    let clock = Arc::new(RecordingClock::default());
    let scheduler = CameraScheduler::builder(
        source.clone(),
        Arc::new(ModelRegistry::empty()),
        Arc::new(LogDispatcher),
    )
    .clock(clock.clone())
    .build();
    source.attach(&scheduler);

    for id in 1..=3 {
        scheduler.enroll(camera(id, DetectionClass::Theft)).unwrap();
    }
    source.during_capture_of(2, |s| s.enroll(camera(4, DetectionClass::Theft)).unwrap());

    let first = scheduler.tick().await.unwrap();
    assert_eq!(first.camera.id, CameraId(1));
    assert_eq!(first.pacing.camera_interval, Duration::from_millis(10_000));
    assert_eq!(first.next_delay, Some(Duration::from_millis(10_000)));
    clock.take();

    let second = scheduler.tick().await.unwrap();
    assert_eq!(second.camera.id, CameraId(2));
    assert_eq!(second.pacing.camera_interval, Duration::from_millis(10_000));
    assert_eq!(second.pacing.frame_interval, Duration::from_millis(3_333));
    assert_eq!(clock.take(), vec![Duration::from_millis(3_333); 2]);
    assert_eq!(second.next_delay, Some(Duration::from_millis(7_500)));
    assert_eq!(scheduler.status().queue_size, 4);

    let third = scheduler.tick().await.unwrap();
    assert_eq!(third.camera.id, CameraId(3));
    assert_eq!(third.pacing.camera_interval, Duration::from_millis(7_500));
    assert_eq!(third.pacing.frame_interval, Duration::from_millis(2_500));

    let fourth = scheduler.tick().await.unwrap();
    assert_eq!(fourth.camera.id, CameraId(4));
    assert_eq!(source.captures(4), 3);
}

#[tokio::test]
async fn sampling_window_of_next_owner_sets_delay() {
    let scheduler = CameraScheduler::builder(
        Arc::new(StillSource::default()),
        Arc::new(ModelRegistry::empty()),
        Arc::new(LogDispatcher),
    )
    .clock(Arc::new(RecordingClock::default()))
    .build();
    scheduler.enroll(camera(1, DetectionClass::Theft)).unwrap();
    let mut other = camera(2, DetectionClass::Theft);
    other.user_id = "night-shift".into();
    scheduler.enroll(other).unwrap();
    scheduler.set_sampling_window("night-shift", 10_000).unwrap();

    let report = scheduler.tick().await.unwrap();
    assert_eq!(report.pacing.camera_interval, Duration::from_millis(15_000));
    assert_eq!(report.next_delay, Some(Duration::from_millis(5_000)));
}

#[tokio::test]
async fn dequeued_camera_is_not_visited() {
    let source = Arc::new(StillSource::default());
    let scheduler = CameraScheduler::builder(
        source.clone(),
        Arc::new(ModelRegistry::empty()),
        Arc::new(LogDispatcher),
    )
    .clock(Arc::new(RecordingClock::default()))
    .build();
    scheduler.enroll(camera(1, DetectionClass::Theft)).unwrap();

    let removed = scheduler.dequeue(CameraId(1));
    assert!(removed.is_some());
    assert!(scheduler.dequeue(CameraId(1)).is_none());
    assert!(scheduler.tick().await.is_none());
    assert!(scheduler.status().per_camera.is_empty());
    assert_eq!(source.captures(1), 0);
}

#[tokio::test]
async fn loop_idles_when_empty_and_restarts_on_enroll() {
    let scheduler = CameraScheduler::builder(
        Arc::new(OfflineSource),
        Arc::new(ModelRegistry::empty()),
        Arc::new(LogDispatcher),
    )
    .clock(Arc::new(ParkedClock))
    .default_settings(single_frame())
    .build();

    scheduler.start();
    assert_eq!(scheduler.state(), SchedulerState::Idle);
    assert!(!scheduler.status().running);

    scheduler.enroll(camera(1, DetectionClass::FireSmoke)).unwrap();
    assert_eq!(scheduler.state(), SchedulerState::Running);
    assert!(scheduler.status().running);

    scheduler.dequeue(CameraId(1));
    assert!(wait_for_state(&scheduler, SchedulerState::Idle).await);

    scheduler.enroll(camera(2, DetectionClass::FireSmoke)).unwrap();
    assert_eq!(scheduler.state(), SchedulerState::Running);

    scheduler.stop();
}

#[tokio::test]
async fn stop_is_not_undone_by_enrollment() {
    let scheduler = CameraScheduler::builder(
        Arc::new(OfflineSource),
        Arc::new(ModelRegistry::empty()),
        Arc::new(LogDispatcher),
    )
    .clock(Arc::new(ParkedClock))
    .default_settings(single_frame())
    .build();

    scheduler.enroll(camera(1, DetectionClass::Weapon)).unwrap();
    scheduler.start();
    assert_eq!(scheduler.state(), SchedulerState::Running);

    scheduler.stop();
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    scheduler.enroll(camera(2, DetectionClass::Weapon)).unwrap();
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert_eq!(scheduler.status().queue_size, 2);

    scheduler.start();
    assert_eq!(scheduler.state(), SchedulerState::Running);
    scheduler.stop();
}

#[tokio::test]
async fn camera_dequeued_during_its_turn_still_alerts() {
    let source = Arc::new(StillSource::default());
    let registry = ModelRegistry::empty()
        .with_detector(
            DetectionClass::Weapon,
            Arc::new(ScriptedDetector::new(
                DetectionClass::Weapon,
                "gun",
                drifting_boxes(),
            )),
        )
        .with_depth(Arc::new(FakeDepth { varied: true }));
    let (dispatcher, mut alerts) = ChannelDispatcher::channel(4);
    let scheduler = CameraScheduler::builder(source.clone(), Arc::new(registry), Arc::new(dispatcher))
        .clock(Arc::new(RecordingClock::default()))
        .build();
    source.attach(&scheduler);
    source.during_capture_of(7, |s| {
        assert!(s.dequeue(CameraId(7)).is_some());
    });
    scheduler.enroll(camera(7, DetectionClass::Weapon)).unwrap();

    let report = scheduler.tick().await.unwrap();
    assert!(report.outcome.is_confirmed());
    assert_eq!(source.captures(7), 3);
    assert_eq!(report.next_delay, None);

    let alert = tokio::time::timeout(Duration::from_secs(5), alerts.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(alert.camera_id, CameraId(7));

    let status = scheduler.status();
    assert_eq!(status.queue_size, 0);
    assert!(!status.per_camera.contains_key(&CameraId(7)));
}

#[tokio::test]
async fn failed_capture_skips_only_that_frame() {
    let registry = ModelRegistry::empty().with_detector(
        DetectionClass::Weapon,
        Arc::new(ScriptedDetector::new(DetectionClass::Weapon, "gun", same_box())),
    );
    let scheduler = CameraScheduler::builder(
        Arc::new(FlakySource {
            fail_call: 1,
            calls: AtomicUsize::new(0),
        }),
        Arc::new(registry),
        Arc::new(LogDispatcher),
    )
    .clock(Arc::new(RecordingClock::default()))
    .build();
    scheduler.enroll(camera(1, DetectionClass::Weapon)).unwrap();

    let report = scheduler.tick().await.unwrap();
    match &report.outcome {
        TurnOutcome::Static { motion } => assert_eq!(motion.frames_considered, 2),
        other => panic!("expected static outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn inference_error_leaves_frame_without_detections() {
    let registry = ModelRegistry::empty().with_detector(
        DetectionClass::Weapon,
        Arc::new(FailsOnceDetector {
            calls: AtomicUsize::new(0),
        }),
    );
    let scheduler = CameraScheduler::builder(
        Arc::new(StillSource::default()),
        Arc::new(registry),
        Arc::new(LogDispatcher),
    )
    .clock(Arc::new(RecordingClock::default()))
    .build();
    scheduler.enroll(camera(1, DetectionClass::Weapon)).unwrap();

    let report = scheduler.tick().await.unwrap();
    match &report.outcome {
        TurnOutcome::Static { motion } => assert_eq!(motion.frames_considered, 2),
        other => panic!("expected static outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn flickering_fire_is_confirmed() {
    let registry = ModelRegistry::empty().with_detector(
        DetectionClass::FireSmoke,
        Arc::new(ScriptedDetector::new(
            DetectionClass::FireSmoke,
            "fire",
            drifting_boxes(),
        )),
    );
    let (dispatcher, mut alerts) = ChannelDispatcher::channel(4);
    let scheduler = CameraScheduler::builder(
        Arc::new(FlickerSource::default()),
        Arc::new(registry),
        Arc::new(dispatcher),
    )
    .clock(Arc::new(RecordingClock::default()))
    .build();
    scheduler.enroll(camera(3, DetectionClass::FireSmoke)).unwrap();

    let report = scheduler.tick().await.unwrap();
    assert!(report.outcome.is_confirmed(), "got {:?}", report.outcome);

    let alert = tokio::time::timeout(Duration::from_secs(5), alerts.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(alert.detection_class, DetectionClass::FireSmoke);
    assert_eq!(alert.verification.liveness.method, LivenessMethod::Flicker);
    assert!(alert.verification.liveness.is_live);
    assert!(!alert.verification.liveness.fail_open);
}

#[tokio::test]
async fn refilled_set_keeps_armed_delay() {
    let source = Arc::new(StillSource::default());
    let clock = Arc::new(ParkedRecordingClock::default());
    let scheduler = CameraScheduler::builder(
        source.clone(),
        Arc::new(ModelRegistry::empty()),
        Arc::new(LogDispatcher),
    )
    .clock(clock.clone())
    .default_settings(single_frame())
    .build();
    source.attach(&scheduler);
    source.during_capture_of(1, |s| {
        s.dequeue(CameraId(1));
        s.enroll(camera(2, DetectionClass::Theft)).unwrap();
    });

    scheduler.enroll(camera(1, DetectionClass::Theft)).unwrap();
    scheduler.start();

    for _ in 0..200 {
        if !clock.sleeps().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(clock.sleeps(), vec![Duration::from_secs(30)]);
    assert_eq!(source.captures(2), 0);
    assert_eq!(scheduler.state(), SchedulerState::Running);

    scheduler.stop();
}

#[tokio::test]
async fn wait_idle_lets_the_running_turn_finish() {
    let source = Arc::new(GateSource::default());
    let scheduler = CameraScheduler::builder(
        source.clone(),
        Arc::new(ModelRegistry::empty()),
        Arc::new(LogDispatcher),
    )
    .clock(Arc::new(RecordingClock::default()))
    .default_settings(single_frame())
    .build();
    scheduler.enroll(camera(1, DetectionClass::Theft)).unwrap();

    let ticking = scheduler.clone();
    let turn = tokio::spawn(async move { ticking.tick().await });
    source.entered.notified().await;

    scheduler.stop();
    assert!(
        tokio::time::timeout(Duration::from_millis(50), scheduler.wait_idle())
            .await
            .is_err()
    );

    source.release.notify_one();
    tokio::time::timeout(Duration::from_secs(5), scheduler.wait_idle())
        .await
        .unwrap();
    let report = turn.await.unwrap().unwrap();
    assert_eq!(report.camera.id, CameraId(1));
}
