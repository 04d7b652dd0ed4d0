//! Headless canvas that records draw calls.
//!
//! Used by tests and by hosts without a browser. Hit testing is real
//! (winding numbers); text is measured with a fixed-advance approximation
//! of the font size; pixels read back only what was explicitly seeded.
//! Clones share one recording, so a caller can keep a handle to a canvas
//! it has handed to a surface.

use crate::canvas::{Canvas, TextMetrics, TextRun};
use crate::hit::point_in_path;
use kurbo::{BezPath, Point, Rect, Size};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wassily_core::Style;

/// Font size used when no font (or an unparseable one) is set.
pub const DEFAULT_FONT_PX: f64 = 10.0;

/// One recorded canvas call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    Save,
    Restore,
    Style(Style),
    Color(String),
    Stroke(BezPath),
    Fill(BezPath),
    Text(TextRun),
    Image { name: String, rect: Rect },
}

#[derive(Debug, Default)]
struct Recording {
    ops: Vec<DrawOp>,
    images: HashMap<String, Size>,
    pixels: HashMap<(i64, i64), [u8; 4]>,
    depth: usize,
}

#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    width: f64,
    height: f64,
    recording: Rc<RefCell<Recording>>,
}

impl RecordingCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            recording: Rc::default(),
        }
    }

    /// Register an image's natural size under `name`.
    pub fn with_image(self, name: impl Into<String>, size: Size) -> Self {
        self.add_image(name, size);
        self
    }

    pub fn add_image(&self, name: impl Into<String>, size: Size) {
        self.recording.borrow_mut().images.insert(name.into(), size);
    }

    /// Seed a pixel value at canvas coordinates.
    pub fn set_pixel(&self, x: i64, y: i64, rgba: [u8; 4]) {
        self.recording.borrow_mut().pixels.insert((x, y), rgba);
    }

    pub fn ops(&self) -> Vec<DrawOp> {
        self.recording.borrow().ops.clone()
    }

    pub fn take_ops(&self) -> Vec<DrawOp> {
        std::mem::take(&mut self.recording.borrow_mut().ops)
    }

    /// Open save() calls not yet restored.
    pub fn save_depth(&self) -> usize {
        self.recording.borrow().depth
    }

    /// Ops recorded since the last `Clear`.
    pub fn last_pass(&self) -> Vec<DrawOp> {
        let recording = self.recording.borrow();
        let start = recording
            .ops
            .iter()
            .rposition(|op| *op == DrawOp::Clear)
            .map_or(0, |i| i + 1);
        recording.ops[start..].to_vec()
    }

    /// Stroked or filled paths of the last pass, in paint order.
    pub fn painted_paths(&self) -> Vec<BezPath> {
        self.last_pass()
            .into_iter()
            .filter_map(|op| match op {
                DrawOp::Stroke(p) | DrawOp::Fill(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn push(&self, op: DrawOp) {
        self.recording.borrow_mut().ops.push(op);
    }
}

/// Pixel size from a CSS font shorthand such as `"bold 16px serif"`.
pub fn font_px(font: Option<&str>) -> f64 {
    font.and_then(|f| {
        f.split_whitespace()
            .find_map(|word| word.strip_suffix("px")?.parse::<f64>().ok())
    })
    .unwrap_or(DEFAULT_FONT_PX)
}

impl Canvas for RecordingCanvas {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn clear(&mut self) {
        self.push(DrawOp::Clear);
    }

    fn save(&mut self) {
        self.recording.borrow_mut().depth += 1;
        self.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        {
            let mut recording = self.recording.borrow_mut();
            recording.depth = recording.depth.saturating_sub(1);
        }
        self.push(DrawOp::Restore);
    }

    fn apply_style(&mut self, style: &Style) {
        self.push(DrawOp::Style(style.clone()));
    }

    fn set_color(&mut self, color: &str) {
        self.push(DrawOp::Color(color.to_owned()));
    }

    fn stroke(&mut self, path: &BezPath) {
        self.push(DrawOp::Stroke(path.clone()));
    }

    fn fill(&mut self, path: &BezPath) {
        self.push(DrawOp::Fill(path.clone()));
    }

    fn fill_text(&mut self, run: &TextRun) {
        self.push(DrawOp::Text(run.clone()));
    }

    fn measure_text(&self, text: &str, font: Option<&str>) -> TextMetrics {
        let px = font_px(font);
        TextMetrics {
            width: text.chars().count() as f64 * px * 0.6,
            ascent: px * 0.8,
            descent: px * 0.2,
            left: 0.0,
        }
    }

    fn draw_image(&mut self, name: &str, rect: Rect) {
        if self.image_size(name).is_some() {
            self.push(DrawOp::Image {
                name: name.to_owned(),
                rect,
            });
        } else {
            log::warn!("drawing unregistered image {name:?}");
        }
    }

    fn image_size(&self, name: &str) -> Option<Size> {
        self.recording.borrow().images.get(name).copied()
    }

    fn is_point_in_path(&self, path: &BezPath, point: Point) -> bool {
        point_in_path(path, point)
    }

    fn pixel_at(&self, point: Point) -> Option<[u8; 4]> {
        let key = (point.x.floor() as i64, point.y.floor() as i64);
        let recording = self.recording.borrow();
        Some(recording.pixels.get(&key).copied().unwrap_or([0, 0, 0, 0]))
    }
}
