//! Bounding-box accumulator for the points touched during a draw pass.
//!
//! Coordinates are cartesian pixels (y up). The surface resets the stats
//! at the start of every pass; fitting consumes them afterwards.

use kurbo::{Point, Rect};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CanvasStats {
    min: Option<Point>,
    max: Option<Point>,
}

impl CanvasStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include a point. Non-finite points are dropped.
    pub fn add_point(&mut self, point: Point) {
        if !point.is_finite() {
            log::warn!("ignoring non-finite stats point {point:?}");
            return;
        }
        match (self.min, self.max) {
            (Some(min), Some(max)) => {
                self.min = Some(Point::new(min.x.min(point.x), min.y.min(point.y)));
                self.max = Some(Point::new(max.x.max(point.x), max.y.max(point.y)));
            }
            _ => {
                self.min = Some(point);
                self.max = Some(point);
            }
        }
    }

    pub fn add_xy(&mut self, x: f64, y: f64) {
        self.add_point(Point::new(x, y));
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none()
    }

    pub fn min(&self) -> Option<Point> {
        self.min
    }

    pub fn max(&self) -> Option<Point> {
        self.max
    }

    /// The accumulated box, if anything was added.
    pub fn bounds(&self) -> Option<Rect> {
        Some(Rect::from_points(self.min?, self.max?))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
