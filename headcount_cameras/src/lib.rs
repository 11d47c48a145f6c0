// THEORY:
// OpenCV behind the `headcount` capability traits. The library crate stays free of
// any vision dependency; this crate is the only place that links OpenCV and the
// only place the binaries get their camera, classifier, tracker and windows from.

pub mod camera;
pub mod detection;
pub mod preview;

pub use camera::{CameraFrame, CameraSource};
pub use detection::{CascadeDetector, KcfTracker, KcfTrackers};
pub use preview::PreviewWindows;

use headcount::Error;
use headcount::BoundingBox;
use opencv::core::Rect;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "headcount=info,headcount_cameras=info,people_count=info,live_video=info";

/// Installs the `fmt` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Maps an OpenCV failure into the library error, tagged with what was attempted.
pub(crate) fn cv(context: &'static str) -> impl FnOnce(opencv::Error) -> Error {
    move |e| Error::vision(context, e)
}

pub(crate) fn to_rect(bbox: BoundingBox) -> Rect {
    Rect::new(bbox.x, bbox.y, bbox.width, bbox.height)
}

pub(crate) fn from_rect(rect: Rect) -> BoundingBox {
    BoundingBox::new(rect.x, rect.y, rect.width, rect.height)
}
