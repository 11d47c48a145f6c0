// THEORY:
// The `pipeline` module is the top-level API of the counter. It owns one feed per
// camera (a frame source plus its session), the shared detector and tracker
// factory, and the log sink, and it runs the single cooperative polling loop:
//
// 1.  **Capture**: one blocking read per camera. All reads finish before any
//     frame is processed. End-of-stream or a read error on any camera stops the
//     loop gracefully.
// 2.  **Detection & Tracking**: each frame goes through its camera's session and
//     comes back annotated.
// 3.  **Periodic Logging**: every session gets the chance to close its cycle; the
//     rows it produces are appended to the sink. Write failures propagate.
// 4.  **Display**: the caller gets the annotated frames and decides whether to go
//     on (this is where the quit key is checked).
//
// Nothing here runs concurrently. The loop blocks on camera reads and on file writes.

use crate::core_modules::capability::{Detector, FrameSource, TrackerFactory};
use crate::core_modules::cycle::CameraId;
use crate::core_modules::log_sink::LogSink;
use crate::core_modules::session::{CameraSession, SessionConfig};
use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use tracing::{info, warn};

/// Why the polling loop ended without an error.
#[derive(Debug)]
pub enum StopReason {
    EndOfStream(CameraId),
    ReadFailed { camera: CameraId, error: Error },
    QuitRequested,
}

/// What one polling iteration produced.
#[derive(Debug)]
pub enum PollOutcome<F> {
    Frames(Vec<(CameraId, F)>),
    Stopped(StopReason),
}

/// Returned by the display callback of `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Quit,
}

/// A camera and the session counting its frames.
pub struct CameraFeed<S, K> {
    source: S,
    session: CameraSession<K>,
}

impl<S, K> CameraFeed<S, K> {
    pub fn session(&self) -> &CameraSession<K> {
        &self.session
    }
}

/// The multi-camera counting loop.
pub struct CountingPipeline<S, D, T>
where
    S: FrameSource,
    T: TrackerFactory<S::Frame>,
{
    feeds: Vec<CameraFeed<S, T::Tracker>>,
    detector: D,
    trackers: T,
    sink: LogSink,
}

impl<S, D, T> CountingPipeline<S, D, T>
where
    S: FrameSource,
    D: Detector<S::Frame>,
    T: TrackerFactory<S::Frame>,
{
    /// Opens every camera's log for `now`'s day and starts a session per camera.
    pub fn new(
        sources: Vec<(CameraId, S)>,
        detector: D,
        trackers: T,
        mut sink: LogSink,
        config: &SessionConfig,
        now: NaiveDateTime,
    ) -> Result<Self> {
        let mut feeds = Vec::with_capacity(sources.len());
        for (camera, source) in sources {
            let path = sink.open(camera, now.date())?;
            info!(%camera, log = %path.display(), "camera session started");
            feeds.push(CameraFeed {
                source,
                session: CameraSession::new(camera, now, config.clone()),
            });
        }
        Ok(Self {
            feeds,
            detector,
            trackers,
            sink,
        })
    }

    pub fn feeds(&self) -> &[CameraFeed<S, T::Tracker>] {
        &self.feeds
    }

    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    /// Runs one iteration of the polling loop at wall-clock time `now`.
    pub fn poll_once(&mut self, now: NaiveDateTime) -> Result<PollOutcome<S::Frame>> {
        // --- 1. Capture ---
        let mut frames = Vec::with_capacity(self.feeds.len());
        for feed in &mut self.feeds {
            let camera = feed.session.camera();
            match feed.source.read() {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => return Ok(PollOutcome::Stopped(StopReason::EndOfStream(camera))),
                Err(error) => return Ok(PollOutcome::Stopped(StopReason::ReadFailed { camera, error })),
            }
        }

        // --- 2. Detection & Tracking ---
        let mut annotated = Vec::with_capacity(frames.len());
        for (feed, frame) in self.feeds.iter_mut().zip(frames) {
            let frame = feed
                .session
                .ingest_frame(frame, &mut self.detector, &mut self.trackers);
            annotated.push((feed.session.camera(), frame));
        }

        // --- 3. Periodic Logging ---
        for feed in &mut self.feeds {
            if let Some(row) = feed.session.maybe_flush(now) {
                self.sink.append(feed.session.camera(), row)?;
            }
        }

        Ok(PollOutcome::Frames(annotated))
    }

    /// Polls until a camera stops or `display` asks to quit.
    ///
    /// `clock` supplies the wall-clock time of each iteration. Errors are only
    /// returned for failures that must end the process (log writes).
    pub fn run(
        &mut self,
        mut clock: impl FnMut() -> NaiveDateTime,
        mut display: impl FnMut(&[(CameraId, S::Frame)]) -> Result<LoopControl>,
    ) -> Result<StopReason> {
        let reason = loop {
            match self.poll_once(clock())? {
                PollOutcome::Frames(frames) => {
                    if display(&frames)? == LoopControl::Quit {
                        break StopReason::QuitRequested;
                    }
                }
                PollOutcome::Stopped(reason) => break reason,
            }
        };
        match &reason {
            StopReason::EndOfStream(camera) => info!(%camera, "camera stream ended"),
            StopReason::ReadFailed { camera, error } => warn!(%camera, %error, "camera read failed"),
            StopReason::QuitRequested => info!("quit key pressed"),
        }
        Ok(reason)
    }
}
