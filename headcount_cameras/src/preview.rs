// THEORY:
// The interactive windows the operator watches. Windows are created up front and
// destroyed when the guard is dropped; the quit key is polled once per iteration.

use crate::cv;
use headcount::Result;
use opencv::{core::Mat, highgui};
use tracing::warn;

/// Owns the preview windows for the lifetime of a run.
pub struct PreviewWindows {
    titles: Vec<String>,
}

impl PreviewWindows {
    pub fn open<I, S>(titles: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let titles: Vec<String> = titles.into_iter().map(Into::into).collect();
        for title in &titles {
            highgui::named_window(title, highgui::WINDOW_NORMAL).map_err(cv("create preview window"))?;
        }
        Ok(Self { titles })
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn show(&self, title: &str, frame: &Mat) -> Result<()> {
        highgui::imshow(title, frame).map_err(cv("show frame"))
    }

    /// Waits a millisecond for input and reports whether `key` was pressed.
    pub fn quit_pressed(&self, key: i32) -> Result<bool> {
        let pressed = highgui::wait_key(1).map_err(cv("poll keyboard"))?;
        Ok(pressed >= 0 && (pressed & 0xFF) == key)
    }
}

impl Drop for PreviewWindows {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_all_windows() {
            warn!(error = %e, "could not close preview windows");
        }
    }
}
