use anyhow::{Context, Result};
use headcount::{CameraId, CounterConfig, FrameSource};
use headcount_cameras::{CameraSource, PreviewWindows, init_tracing};
use tracing::{info, warn};

const WINDOW_TITLE: &str = "Live Video";

/// Device index and quit key code of the preview.
///
/// The preview writes no logs, so the counting overrides are never read here.
fn preview_settings() -> (i32, i32) {
    let config = CounterConfig::default();
    let device_index = config.cameras.first().map_or(0, |c| c.device_index);
    (device_index, config.quit_key_code())
}

fn main() -> Result<()> {
    init_tracing();

    let (device_index, quit_key) = preview_settings();

    let mut camera = CameraSource::open(CameraId(1), device_index).context("Failed to open webcam")?;
    let windows = PreviewWindows::open([WINDOW_TITLE])?;

    loop {
        let frame = match camera.read() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("camera stream ended");
                break;
            }
            Err(e) => {
                warn!(error = %e, "error reading frame");
                break;
            }
        };
        windows.show(WINDOW_TITLE, frame.mat())?;
        if windows.quit_pressed(quit_key)? {
            break;
        }
    }
    Ok(())
}
