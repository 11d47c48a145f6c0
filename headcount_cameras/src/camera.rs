// THEORY:
// A `CameraSource` is one opened `VideoCapture`. Opening failures are reported as
// `DeviceOpen`; a failed or empty read is the end of the stream. The device is
// released when the source is dropped, so every exit path of the binaries (quit
// key, stream end, a propagated error) gives the camera back.

use crate::{cv, to_rect};
use headcount::{BoundingBox, CameraId, Error, Frame, FrameSource, Result};
use opencv::{
    core::{Mat, Point, Scalar},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use tracing::{debug, info, warn};

const STATUS_ORIGIN: (i32, i32) = (10, 30);
const STATUS_SCALE: f64 = 0.8;

/// A BGR frame straight from the camera.
pub struct CameraFrame {
    mat: Mat,
}

impl CameraFrame {
    pub fn mat(&self) -> &Mat {
        &self.mat
    }
}

impl Frame for CameraFrame {
    type Gray = Mat;

    fn to_grayscale(&self) -> Result<Mat> {
        let mut gray = Mat::default();
        imgproc::cvt_color(&self.mat, &mut gray, imgproc::COLOR_BGR2GRAY, 0).map_err(cv("convert frame to grayscale"))?;
        Ok(gray)
    }

    fn draw_box(&mut self, bbox: BoundingBox) -> Result<()> {
        let green = Scalar::new(0.0, 255.0, 0.0, 0.0);
        imgproc::rectangle(&mut self.mat, to_rect(bbox), green, 2, imgproc::LINE_8, 0).map_err(cv("draw tracked box"))
    }

    fn draw_status(&mut self, text: &str) -> Result<()> {
        let red = Scalar::new(0.0, 0.0, 255.0, 0.0);
        imgproc::put_text(
            &mut self.mat,
            text,
            Point::new(STATUS_ORIGIN.0, STATUS_ORIGIN.1),
            imgproc::FONT_HERSHEY_SIMPLEX,
            STATUS_SCALE,
            red,
            2,
            imgproc::LINE_8,
            false,
        )
        .map_err(cv("draw status caption"))
    }
}

/// An opened webcam.
pub struct CameraSource {
    camera: CameraId,
    capture: VideoCapture,
}

impl CameraSource {
    pub fn open(camera: CameraId, device_index: i32) -> Result<Self> {
        let capture = VideoCapture::new(device_index, capture_api()).map_err(|e| {
            warn!(%camera, device_index, error = %e, "VideoCapture failed");
            Error::DeviceOpen { index: device_index }
        })?;
        if !capture.is_opened().unwrap_or(false) {
            return Err(Error::DeviceOpen { index: device_index });
        }
        info!(%camera, device_index, "camera opened");
        Ok(Self { camera, capture })
    }

    pub fn camera(&self) -> CameraId {
        self.camera
    }
}

impl FrameSource for CameraSource {
    type Frame = CameraFrame;

    fn read(&mut self) -> Result<Option<CameraFrame>> {
        let mut mat = Mat::default();
        let grabbed = self.capture.read(&mut mat).map_err(cv("read frame"))?;
        if !grabbed || mat.empty() {
            return Ok(None);
        }
        Ok(Some(CameraFrame { mat }))
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        match self.capture.release() {
            Ok(()) => debug!(camera = %self.camera, "camera released"),
            Err(e) => warn!(camera = %self.camera, error = %e, "camera release failed"),
        }
    }
}

/// DirectShow opens USB webcams fastest on Windows; elsewhere let OpenCV choose.
fn capture_api() -> i32 {
    if cfg!(windows) {
        videoio::CAP_DSHOW
    } else {
        videoio::CAP_ANY
    }
}
