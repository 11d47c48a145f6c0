// THEORY:
// A `CameraSession` is everything one camera remembers between frames: the
// trackers it has spawned, the identifier counter, and the open detection cycle.
// It replaces loose per-camera counters and maps with one object built at start-up.
//
// Per frame (`ingest_frame`):
// 1.  **Detection**: the grayscale conversion goes through the upper-body detector.
//     A failing detector counts as "nobody found"; it is never escalated.
// 2.  **Tracking**: every registered tracker is updated in identifier order. A hit
//     marks the identifier as seen in this cycle; a miss is skipped. Missed trackers
//     stay registered.
// 3.  **Spawning**: every detected region gets a brand new identifier and tracker.
//     Regions are NOT matched against existing trackers, so a person who is both
//     tracked and re-detected is counted twice. That is the reference counting
//     policy and it is kept on purpose; see DESIGN.md before changing it.
// 4.  **Overlays**: boxes and the status caption are drawn last, so trackers are
//     always initialised and updated on the clean frame.
//
// Memory: with no `max_tracked` cap the tracker map only grows. The cap is an
// opt-in retention policy that evicts the oldest identifiers first.

use crate::core_modules::capability::{DetectionParams, Detector, Frame, ObjectTracker, TrackerFactory};
use crate::core_modules::cycle::{CameraId, DetectionCycle, LogRow};
use crate::core_modules::geometry::BoundingBox;
use chrono::{NaiveDateTime, TimeDelta};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Identifiers start here and grow by one per detected region.
pub const FIRST_IDENTIFIER: u64 = 1;

/// Per-camera tunables, shared by every session of a pipeline.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub flush_interval: TimeDelta,
    pub detection: DetectionParams,
    /// Upper bound on registered trackers. `None` keeps every tracker forever.
    pub max_tracked: Option<usize>,
    pub status_text: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            flush_interval: TimeDelta::seconds(300),
            detection: DetectionParams::default(),
            max_tracked: None,
            status_text: "System Online".to_string(),
        }
    }
}

/// A tracker together with the identifier it was spawned under.
#[derive(Debug)]
pub struct TrackedPerson<K> {
    pub id: u64,
    pub last_box: BoundingBox,
    tracker: K,
}

/// Tracking and flush state for a single camera.
pub struct CameraSession<K> {
    camera: CameraId,
    config: SessionConfig,
    tracked: BTreeMap<u64, TrackedPerson<K>>,
    next_id: u64,
    cycle: DetectionCycle,
}

impl<K> CameraSession<K> {
    pub fn new(camera: CameraId, started_at: NaiveDateTime, config: SessionConfig) -> Self {
        Self {
            camera,
            config,
            tracked: BTreeMap::new(),
            next_id: FIRST_IDENTIFIER,
            cycle: DetectionCycle::new(camera, started_at),
        }
    }

    pub fn camera(&self) -> CameraId {
        self.camera
    }

    pub fn cycle(&self) -> &DetectionCycle {
        &self.cycle
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    pub fn tracked(&self) -> impl Iterator<Item = &TrackedPerson<K>> {
        self.tracked.values()
    }

    /// The identifier the next detected region will receive.
    pub fn next_identifier(&self) -> u64 {
        self.next_id
    }

    /// Runs detection and tracking on `frame` and returns it with overlays drawn.
    pub fn ingest_frame<F, D, T>(&mut self, mut frame: F, detector: &mut D, trackers: &mut T) -> F
    where
        F: Frame,
        K: ObjectTracker<F>,
        D: Detector<F>,
        T: TrackerFactory<F, Tracker = K>,
    {
        // --- 1. Detection ---
        let regions = match frame
            .to_grayscale()
            .and_then(|gray| detector.detect(&gray, &self.config.detection))
        {
            Ok(regions) => regions,
            Err(e) => {
                warn!(camera = %self.camera, error = %e, "upper-body detection failed");
                Vec::new()
            }
        };

        // --- 2. Update Existing Trackers ---
        let mut overlays = Vec::with_capacity(self.tracked.len() + regions.len());
        for person in self.tracked.values_mut() {
            match person.tracker.update(&frame) {
                Ok(Some(bbox)) => {
                    person.last_box = bbox;
                    overlays.push(bbox);
                    self.cycle.observe(person.id);
                }
                Ok(None) => debug!(camera = %self.camera, id = person.id, "tracker lost target"),
                Err(e) => debug!(camera = %self.camera, id = person.id, error = %e, "tracker update failed"),
            }
        }

        // --- 3. Spawn A Tracker Per Detected Region ---
        for region in regions {
            let id = self.next_id;
            self.next_id += 1;
            match trackers.create(&frame, region) {
                Ok(tracker) => {
                    debug!(camera = %self.camera, id, ?region, "new person");
                    self.tracked.insert(
                        id,
                        TrackedPerson {
                            id,
                            last_box: region,
                            tracker,
                        },
                    );
                }
                Err(e) => warn!(camera = %self.camera, id, error = %e, "could not create tracker"),
            }
            self.cycle.observe(id);
        }
        self.enforce_capacity();

        // --- 4. Overlays ---
        for bbox in overlays {
            if let Err(e) = frame.draw_box(bbox) {
                warn!(camera = %self.camera, error = %e, "could not draw overlay");
            }
        }
        if let Err(e) = frame.draw_status(&self.config.status_text) {
            warn!(camera = %self.camera, error = %e, "could not draw status caption");
        }
        frame
    }

    /// Closes the detection cycle once the flush interval has elapsed.
    ///
    /// Returns a row only when someone was seen; an idle window just restarts the
    /// cycle at `now`.
    pub fn maybe_flush(&mut self, now: NaiveDateTime) -> Option<LogRow> {
        if self.cycle.elapsed(now) < self.config.flush_interval {
            return None;
        }
        let row = self.cycle.close(now);
        match &row {
            Some(row) => info!(
                camera = %self.camera,
                detections = row.detection_count,
                since = %row.formatted_timestamp(),
                "detection cycle closed"
            ),
            None => debug!(camera = %self.camera, "idle detection cycle absorbed"),
        }
        row
    }

    fn enforce_capacity(&mut self) {
        let Some(cap) = self.config.max_tracked else {
            return;
        };
        while self.tracked.len() > cap {
            if let Some((id, _)) = self.tracked.pop_first() {
                debug!(camera = %self.camera, id, "evicted oldest tracker");
            }
        }
    }
}
