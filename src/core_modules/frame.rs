// THEORY:
// An `image::RgbImage` implementation of `Frame`, so the counter runs without a
// camera library: replaying stills, headless checks and the test suite all feed
// plain RGB buffers through the same session code the live cameras use.

use crate::core_modules::capability::Frame;
use crate::core_modules::geometry::BoundingBox;
use crate::error::Result;
use image::{GrayImage, Rgb, RgbImage};

/// Overlay colour for tracked people.
pub const TRACKED_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
/// Outline thickness in pixels.
pub const TRACKED_THICKNESS: i32 = 2;

impl Frame for RgbImage {
    type Gray = GrayImage;

    fn to_grayscale(&self) -> Result<GrayImage> {
        Ok(image::imageops::grayscale(self))
    }

    fn draw_box(&mut self, bbox: BoundingBox) -> Result<()> {
        if bbox.is_empty() {
            return Ok(());
        }
        let (right, bottom) = bbox.bottom_right();
        for t in 0..TRACKED_THICKNESS {
            for x in bbox.x..right {
                put_pixel_clipped(self, x, bbox.y + t);
                put_pixel_clipped(self, x, bottom - 1 - t);
            }
            for y in bbox.y..bottom {
                put_pixel_clipped(self, bbox.x + t, y);
                put_pixel_clipped(self, right - 1 - t, y);
            }
        }
        Ok(())
    }
}

fn put_pixel_clipped(image: &mut RgbImage, x: i32, y: i32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x < image.width() && y < image.height() {
        image.put_pixel(x, y, TRACKED_COLOUR);
    }
}
