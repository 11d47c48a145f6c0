// THEORY:
// The two vision capabilities the counter asks OpenCV for:
// 1.  **CascadeDetector**: a Haar cascade (upper body) run with `detect_multi_scale`
//     on the grayscale frame.
// 2.  **KcfTrackers**: one KCF tracker per detected region, initialised on the
//     colour frame the region was found in.

use crate::camera::CameraFrame;
use crate::{cv, from_rect, to_rect};
use headcount::{BoundingBox, DetectionParams, Detector, Error, ObjectTracker, Result, TrackerFactory};
use opencv::{
    core::{Mat, Ptr, Rect, Size, Vector},
    objdetect::CascadeClassifier,
    prelude::*,
    tracking::TrackerKCF,
};
use std::path::Path;
use tracing::info;

/// Upper-body detector backed by a Haar cascade file.
pub struct CascadeDetector {
    classifier: CascadeClassifier,
}

impl CascadeDetector {
    pub fn load(path: &Path) -> Result<Self> {
        let name = path
            .to_str()
            .ok_or_else(|| Error::Config(format!("cascade path {} is not valid UTF-8", path.display())))?;
        let classifier = CascadeClassifier::new(name).map_err(cv("load cascade classifier"))?;
        if classifier.empty().map_err(cv("load cascade classifier"))? {
            return Err(Error::Config(format!("no cascade classifier could be loaded from {}", path.display())));
        }
        info!(cascade = %path.display(), "cascade classifier loaded");
        Ok(Self { classifier })
    }
}

impl Detector<CameraFrame> for CascadeDetector {
    fn detect(&mut self, gray: &Mat, params: &DetectionParams) -> Result<Vec<BoundingBox>> {
        let mut found = Vector::<Rect>::new();
        self.classifier
            .detect_multi_scale(
                gray,
                &mut found,
                params.scale_factor,
                params.min_neighbors,
                0,
                Size::new(params.min_size.0, params.min_size.1),
                Size::new(0, 0),
            )
            .map_err(cv("detect upper bodies"))?;
        Ok(found.iter().map(from_rect).collect())
    }
}

/// Hands out KCF trackers.
#[derive(Debug, Default, Clone, Copy)]
pub struct KcfTrackers;

pub struct KcfTracker {
    inner: Ptr<TrackerKCF>,
}

impl TrackerFactory<CameraFrame> for KcfTrackers {
    type Tracker = KcfTracker;

    fn create(&mut self, frame: &CameraFrame, bbox: BoundingBox) -> Result<KcfTracker> {
        let mut inner = TrackerKCF::create_def().map_err(cv("create KCF tracker"))?;
        inner.init(frame.mat(), to_rect(bbox)).map_err(cv("initialise KCF tracker"))?;
        Ok(KcfTracker { inner })
    }
}

impl ObjectTracker<CameraFrame> for KcfTracker {
    fn update(&mut self, frame: &CameraFrame) -> Result<Option<BoundingBox>> {
        let mut rect = Rect::default();
        let found = self
            .inner
            .update(frame.mat(), &mut rect)
            .map_err(cv("update KCF tracker"))?;
        Ok(found.then(|| from_rect(rect)))
    }
}
