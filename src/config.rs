// THEORY:
// The counter has no command-line surface. Everything it needs is a compiled-in
// default, and a handful of environment variables may override the parts that
// differ between installations (where the cascade file lives, where logs go).

use crate::core_modules::capability::DetectionParams;
use crate::core_modules::cycle::CameraId;
use crate::core_modules::session::SessionConfig;
use crate::error::{Error, Result};
use chrono::TimeDelta;
use std::env;
use std::path::PathBuf;

pub const ENV_CASCADE: &str = "HEADCOUNT_CASCADE";
pub const ENV_LOG_DIR: &str = "HEADCOUNT_LOG_DIR";
pub const ENV_FLUSH_SECS: &str = "HEADCOUNT_FLUSH_SECS";
pub const ENV_MAX_TRACKED: &str = "HEADCOUNT_MAX_TRACKED";

/// Folder the daily logs are kept in, under the user's desktop by default.
pub const LOG_FOLDER_NAME: &str = "Total-Detection";

/// One physical camera.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub id: CameraId,
    pub device_index: i32,
    pub window_title: String,
}

/// Everything the people counter needs to start.
#[derive(Debug, Clone)]
pub struct CounterConfig {
    pub cameras: Vec<CameraConfig>,
    pub cascade_path: PathBuf,
    pub log_dir: PathBuf,
    pub session: SessionConfig,
    /// Pressing this key in a preview window stops the loop.
    pub quit_key: char,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            cameras: vec![
                CameraConfig {
                    id: CameraId(1),
                    device_index: 0,
                    window_title: "Camera 1".to_string(),
                },
                CameraConfig {
                    id: CameraId(2),
                    device_index: 1,
                    window_title: "Camera 2".to_string(),
                },
            ],
            cascade_path: PathBuf::from("haarcascade_upperbody.xml"),
            log_dir: default_log_dir(),
            session: SessionConfig::default(),
            quit_key: 'q',
        }
    }
}

impl CounterConfig {
    /// The defaults with any `HEADCOUNT_*` overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides from `lookup`. Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get(ENV_CASCADE) {
            self.cascade_path = PathBuf::from(path);
        }
        if let Some(dir) = get(ENV_LOG_DIR) {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(secs) = get(ENV_FLUSH_SECS) {
            let secs: i64 = secs
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_FLUSH_SECS} must be a whole number of seconds, got {secs:?}")))?;
            if secs <= 0 {
                return Err(Error::Config(format!("{ENV_FLUSH_SECS} must be positive, got {secs}")));
            }
            self.session.flush_interval = TimeDelta::try_seconds(secs)
                .ok_or_else(|| Error::Config(format!("{ENV_FLUSH_SECS} is out of range, got {secs}")))?;
        }
        if let Some(cap) = get(ENV_MAX_TRACKED) {
            let cap: usize = cap
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_MAX_TRACKED} must be a tracker count, got {cap:?}")))?;
            if cap == 0 {
                return Err(Error::Config(format!("{ENV_MAX_TRACKED} must be at least 1")));
            }
            self.session.max_tracked = Some(cap);
        }
        Ok(self)
    }

    pub fn detection(&self) -> &DetectionParams {
        &self.session.detection
    }

    /// The key code `quit_key` produces in a preview window.
    pub fn quit_key_code(&self) -> i32 {
        self.quit_key as i32
    }
}

fn default_log_dir() -> PathBuf {
    let home = env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join("Desktop").join(LOG_FOLDER_NAME)
}
