use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use headcount::{CountingPipeline, CounterConfig, LogSink, LoopControl};
use headcount_cameras::{CameraSource, CascadeDetector, KcfTrackers, PreviewWindows, init_tracing};
use tracing::info;

fn main() -> Result<()> {
    init_tracing();

    // --- 1. Configuration ---
    let config = CounterConfig::from_env()?;
    info!(
        cameras = config.cameras.len(),
        log_dir = %config.log_dir.display(),
        flush_secs = config.session.flush_interval.num_seconds(),
        "people counter starting"
    );

    // --- 2. Capabilities ---
    let detector = CascadeDetector::load(&config.cascade_path)
        .with_context(|| format!("Failed to load cascade {}", config.cascade_path.display()))?;
    let mut sources = Vec::with_capacity(config.cameras.len());
    for camera in &config.cameras {
        let source = CameraSource::open(camera.id, camera.device_index).context("Failed to open one of the webcams")?;
        sources.push((camera.id, source));
    }
    let windows = PreviewWindows::open(config.cameras.iter().map(|c| c.window_title.clone()))?;

    // --- 3. Counting Pipeline ---
    let sink = LogSink::new(&config.log_dir)
        .with_context(|| format!("Failed to create log folder {}", config.log_dir.display()))?;
    let mut pipeline = CountingPipeline::new(sources, detector, KcfTrackers, sink, &config.session, now())?;

    // --- 4. Main Loop ---
    let quit_key = config.quit_key_code();
    pipeline.run(now, |frames| {
        for (title, (_, frame)) in windows.titles().iter().zip(frames) {
            windows.show(title, frame.mat())?;
        }
        Ok(if windows.quit_pressed(quit_key)? {
            LoopControl::Quit
        } else {
            LoopControl::Continue
        })
    })?;

    Ok(())
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
