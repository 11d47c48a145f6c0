// Scripted stand-ins for the camera, classifier and tracker, for unit tests.

use crate::core_modules::capability::{DetectionParams, Detector, FrameSource, ObjectTracker, TrackerFactory};
use crate::core_modules::geometry::BoundingBox;
use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use image::{GrayImage, RgbImage};
use std::collections::VecDeque;

pub fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

pub fn blank_frame() -> RgbImage {
    RgbImage::new(320, 240)
}

/// Replays one entry per call; `None` entries fail. Once the script runs out it
/// either repeats `tail` or returns nothing.
pub struct ScriptedDetector {
    script: VecDeque<Option<Vec<BoundingBox>>>,
    tail: Vec<BoundingBox>,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Option<Vec<BoundingBox>>>) -> Self {
        Self {
            script: script.into(),
            tail: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn repeating(regions: Vec<BoundingBox>) -> Self {
        Self {
            script: VecDeque::new(),
            tail: regions,
        }
    }
}

impl Detector<RgbImage> for ScriptedDetector {
    fn detect(&mut self, _gray: &GrayImage, _params: &DetectionParams) -> Result<Vec<BoundingBox>> {
        match self.script.pop_front() {
            Some(Some(regions)) => Ok(regions),
            Some(None) => Err(Error::vision("detect upper bodies", "scripted failure")),
            None => Ok(self.tail.clone()),
        }
    }
}

#[derive(Debug)]
pub struct ScriptedTracker {
    bbox: BoundingBox,
    hits_left: Option<usize>,
}

impl ObjectTracker<RgbImage> for ScriptedTracker {
    fn update(&mut self, _frame: &RgbImage) -> Result<Option<BoundingBox>> {
        match &mut self.hits_left {
            None => Ok(Some(self.bbox)),
            Some(0) => Ok(None),
            Some(n) => {
                *n -= 1;
                Ok(Some(self.bbox))
            }
        }
    }
}

pub struct ScriptedTrackers {
    hits: Option<usize>,
    fail: bool,
}

impl ScriptedTrackers {
    pub fn always_hit() -> Self {
        Self { hits: None, fail: false }
    }

    pub fn hits_then_lost(hits: usize) -> Self {
        Self {
            hits: Some(hits),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self { hits: None, fail: true }
    }
}

impl TrackerFactory<RgbImage> for ScriptedTrackers {
    type Tracker = ScriptedTracker;

    fn create(&mut self, _frame: &RgbImage, bbox: BoundingBox) -> Result<ScriptedTracker> {
        if self.fail {
            return Err(Error::vision("create tracker", "scripted failure"));
        }
        Ok(ScriptedTracker {
            bbox,
            hits_left: self.hits,
        })
    }
}

/// Yields `frames` blank frames, then ends the stream or fails.
pub struct ScriptedSource {
    pub frames: usize,
    pub fail_at_end: bool,
}

impl FrameSource for ScriptedSource {
    type Frame = RgbImage;

    fn read(&mut self) -> Result<Option<RgbImage>> {
        if self.frames == 0 {
            if self.fail_at_end {
                return Err(Error::vision("read frame", "device unplugged"));
            }
            return Ok(None);
        }
        self.frames -= 1;
        Ok(Some(blank_frame()))
    }
}
