// THEORY:
// This file is the main entry point for the `headcount` library crate.
//
// The crate counts people in front of one or more webcams. Each camera gets a
// `CameraSession` that spawns a short-lived tracker for every upper body the
// detector finds, remembers which identifiers were seen, and every flush interval
// turns that into a row in a per-day spreadsheet through the `LogSink`. The
// `CountingPipeline` ties cameras, sessions and the sink into one polling loop.
//
// The camera, the classifier and the tracker are capabilities behind traits
// (`core_modules::capability`). This crate never links a vision library; the
// `headcount_cameras` crate plugs OpenCV in, and the `image` crate backs the
// headless frame type used for replay and tests.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use config::{CameraConfig, CounterConfig};
pub use core_modules::capability::{DetectionParams, Detector, Frame, FrameSource, ObjectTracker, TrackerFactory};
pub use core_modules::cycle::{CameraId, DetectionCycle, LogRow, TIMESTAMP_FORMAT};
pub use core_modules::geometry::BoundingBox;
pub use core_modules::log_sink::LogSink;
pub use core_modules::session::{CameraSession, SessionConfig, TrackedPerson};
pub use error::{Error, Result};
pub use pipeline::{CountingPipeline, LoopControl, PollOutcome, StopReason};
