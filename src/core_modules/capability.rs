// THEORY:
// The camera, the upper-body classifier and the single-object tracker are external
// capability providers. This module draws the seam around them as traits so the
// counting logic never names a vision library:
//
// 1.  **Frame**: a colour image that knows its grayscale conversion and how to
//     draw the two overlays the counter uses (a box per tracked person and a
//     status caption).
// 2.  **FrameSource**: one camera. Opening happens in the implementor's
//     constructor; releasing happens when it is dropped.
// 3.  **Detector**: runs on the grayscale frame and returns candidate regions.
// 4.  **TrackerFactory / ObjectTracker**: binds a tracker to a region and then
//     follows it frame by frame.

use crate::core_modules::geometry::BoundingBox;
use crate::error::Result;

/// A colour frame the counter can analyse and annotate.
pub trait Frame {
    /// The single-channel image the detector runs on.
    type Gray;

    fn to_grayscale(&self) -> Result<Self::Gray>;

    /// Draws the outline of a tracked person.
    fn draw_box(&mut self, bbox: BoundingBox) -> Result<()>;

    /// Draws the status caption in the top-left corner. Frames without a font
    /// backend leave the caption out.
    fn draw_status(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }
}

/// A camera (or anything else) producing frames on demand.
pub trait FrameSource {
    type Frame: Frame;

    /// Blocks until the next frame is available. `Ok(None)` means the stream ended.
    fn read(&mut self) -> Result<Option<Self::Frame>>;
}

/// Tunables handed to the upper-body classifier on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    pub scale_factor: f64,
    pub min_neighbors: i32,
    /// Smallest region reported, as (width, height).
    pub min_size: (i32, i32),
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 5,
            min_size: (60, 60),
        }
    }
}

/// Finds upper bodies in a grayscale frame.
pub trait Detector<F: Frame> {
    fn detect(&mut self, gray: &F::Gray, params: &DetectionParams) -> Result<Vec<BoundingBox>>;
}

/// Follows one object across frames.
pub trait ObjectTracker<F> {
    /// Relocates the object in `frame`. `Ok(None)` means it was lost for this frame.
    fn update(&mut self, frame: &F) -> Result<Option<BoundingBox>>;
}

/// Creates trackers bound to a freshly detected region.
pub trait TrackerFactory<F> {
    type Tracker: ObjectTracker<F>;

    fn create(&mut self, frame: &F, bbox: BoundingBox) -> Result<Self::Tracker>;
}
