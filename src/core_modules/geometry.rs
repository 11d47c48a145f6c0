// THEORY:
// Detections and tracker updates both speak in axis-aligned pixel rectangles.
// `BoundingBox` is the "dumb" data container shared by the capability traits, the
// session and the overlays. It mirrors the `(x, y, w, h)` tuples the classifier
// and trackers produce, so adapters convert to and from their native rectangle
// types without any arithmetic.

/// An axis-aligned rectangle in frame pixel coordinates, anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The exclusive bottom-right corner.
    pub fn bottom_right(&self) -> (i32, i32) {
        (self.x + self.width, self.y + self.height)
    }

    /// Whether the box encloses no pixels.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}
