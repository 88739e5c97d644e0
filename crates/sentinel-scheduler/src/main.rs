//! Camera threat scheduler binary.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use sentinel_scheduler::logging::init_tracing;
use sentinel_scheduler::{
    load_cameras, metrics, AlertDispatcher, CameraScheduler, ChannelDispatcher, LogDispatcher,
    SchedulerConfig,
};
use sentinel_vision::{FfmpegFrameSource, ModelRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting sentinel-scheduler");

    let config = SchedulerConfig::from_env();
    info!("Scheduler config: {:?}", config);

    if let Some(port) = config.metrics_port {
        metrics::install_exporter(port)?;
        info!(port, "Prometheus exporter listening");
    }

    let frame_source = FfmpegFrameSource::new(
        config.vision.capture_timeout,
        config.vision.rtsp_transport.clone(),
    )
    .context("ffmpeg is required for frame capture")?;
    let models = ModelRegistry::from_config(&config.vision);

    // Alerts leave the scheduler through a bounded channel; the consumer here
    // only logs them.
    let (dispatcher, mut alerts) = ChannelDispatcher::channel(config.alert_buffer);
    let consumer = tokio::spawn(async move {
        while let Some(alert) = alerts.recv().await {
            if let Err(e) = LogDispatcher.dispatch(alert).await {
                warn!(error = %e, "Alert consumer failed");
            }
        }
    });

    let scheduler = CameraScheduler::builder(
        Arc::new(frame_source),
        Arc::new(models),
        Arc::new(dispatcher),
    )
    .default_settings(config.default_settings)
    .floors(config.floors)
    .build();

    if let Some(path) = &config.cameras_file {
        let cameras = load_cameras(path)
            .with_context(|| format!("failed to read cameras from {}", path.display()))?;
        for camera in cameras.into_iter().filter(|c| c.active) {
            let camera_id = camera.id;
            if let Err(e) = scheduler.enroll(camera) {
                error!(camera_id = %camera_id, error = %e, "Enrollment rejected");
            }
        }
    }

    scheduler.start();
    info!(queue_size = scheduler.status().queue_size, "Scheduler started");

    tokio::signal::ctrl_c().await.ok();
    info!("Received shutdown signal");

    scheduler.stop();
    scheduler.wait_idle().await;
    drop(scheduler);
    consumer.abort();

    info!("Scheduler stopped");
    Ok(())
}
