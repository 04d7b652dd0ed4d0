//! The rasterizer boundary.
//!
//! Everything the scene engine needs from a 2D drawing context is behind
//! [`Canvas`]. Coordinates crossing this trait are native canvas pixels
//! (origin top-left, y down); the scene works in cartesian pixels (y up)
//! and converts with [`to_canvas`] / [`to_cartesian`].

use kurbo::{BezPath, Point, Rect, Size};
use wassily_core::{Style, TextAlign, TextBaseline};

/// Glyph box of a measured string, in canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    /// Distance from the baseline up to the top of the glyphs.
    pub ascent: f64,
    /// Distance from the baseline down to the bottom of the glyphs.
    pub descent: f64,
    /// Distance from the anchor left to the first glyph's left edge.
    pub left: f64,
}

impl TextMetrics {
    pub fn height(&self) -> f64 {
        self.ascent + self.descent
    }
}

/// A text draw request.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Anchor in canvas pixels.
    pub at: Point,
    pub align: TextAlign,
    pub baseline: TextBaseline,
    /// Clockwise rotation about the anchor, in radians.
    pub rotation: f64,
}

/// A 2D drawing context.
pub trait Canvas {
    fn width(&self) -> f64;
    fn height(&self) -> f64;

    /// Erase every pixel.
    fn clear(&mut self);
    fn save(&mut self);
    fn restore(&mut self);

    /// Set stroke and fill color, line width, dash pattern and font.
    fn apply_style(&mut self, style: &Style);
    /// Override stroke and fill color only.
    fn set_color(&mut self, color: &str);

    fn stroke(&mut self, path: &BezPath);
    fn fill(&mut self, path: &BezPath);
    fn fill_text(&mut self, run: &TextRun);
    fn measure_text(&self, text: &str, font: Option<&str>) -> TextMetrics;

    /// Draw a registered image into `rect`. Unknown names draw nothing.
    fn draw_image(&mut self, name: &str, rect: Rect);
    /// Natural size of a registered image, if known and loaded.
    fn image_size(&self, name: &str) -> Option<Size>;

    /// Nonzero-winding containment, subpaths implicitly closed.
    fn is_point_in_path(&self, path: &BezPath, point: Point) -> bool;
    /// RGBA of one pixel, if the canvas can read back.
    fn pixel_at(&self, point: Point) -> Option<[u8; 4]>;
}

/// Cartesian pixel (y up) → canvas pixel (y down).
pub fn to_canvas(point: Point, height: f64) -> Point {
    Point::new(point.x, height - point.y)
}

/// Canvas pixel (y down) → cartesian pixel (y up). The flip is its own inverse.
pub fn to_cartesian(point: Point, height: f64) -> Point {
    Point::new(point.x, height - point.y)
}
