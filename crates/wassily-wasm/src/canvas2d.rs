//! `Canvas` over an HTML canvas 2D context.

use kurbo::{BezPath, PathEl, Point, Rect, Size};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use wassily_core::Style;
use wassily_render::{Canvas, TextMetrics, TextRun};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, Path2d};

/// Images drawable by name. Clones share one registry.
pub type ImageRegistry = Rc<RefCell<HashMap<String, HtmlImageElement>>>;

pub struct WebCanvas {
    element: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    images: ImageRegistry,
}

impl WebCanvas {
    pub fn new(element: HtmlCanvasElement, images: ImageRegistry) -> Result<Self, JsValue> {
        let ctx = element
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            element,
            ctx,
            images,
        })
    }
}

/// Convert a kurbo path into a browser `Path2D`.
fn to_path2d(path: &BezPath) -> Result<Path2d, JsValue> {
    let out = Path2d::new()?;
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => out.move_to(p.x, p.y),
            PathEl::LineTo(p) => out.line_to(p.x, p.y),
            PathEl::QuadTo(c, p) => out.quadratic_curve_to(c.x, c.y, p.x, p.y),
            PathEl::CurveTo(c1, c2, p) => out.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
            PathEl::ClosePath => out.close_path(),
        }
    }
    Ok(out)
}

fn dash_array(dash: Option<&[f64]>) -> js_sys::Array {
    dash.unwrap_or_default()
        .iter()
        .map(|d| JsValue::from_f64(*d))
        .collect()
}

impl Canvas for WebCanvas {
    fn width(&self) -> f64 {
        self.element.width() as f64
    }

    fn height(&self) -> f64 {
        self.element.height() as f64
    }

    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width(), self.height());
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn apply_style(&mut self, style: &Style) {
        self.set_color(&style.color);
        self.ctx.set_line_width(style.line_width);
        let _ = self.ctx.set_line_dash(&dash_array(style.line_dash.as_deref()));
        if let Some(font) = &style.font {
            self.ctx.set_font(font);
        }
    }

    fn set_color(&mut self, color: &str) {
        self.ctx.set_stroke_style_str(color);
        self.ctx.set_fill_style_str(color);
    }

    fn stroke(&mut self, path: &BezPath) {
        match to_path2d(path) {
            Ok(p) => self.ctx.stroke_with_path(&p),
            Err(err) => log::warn!("cannot build Path2D: {err:?}"),
        }
    }

    fn fill(&mut self, path: &BezPath) {
        match to_path2d(path) {
            Ok(p) => self.ctx.fill_with_path_2d(&p),
            Err(err) => log::warn!("cannot build Path2D: {err:?}"),
        }
    }

    fn fill_text(&mut self, run: &TextRun) {
        self.ctx.save();
        let placed = self
            .ctx
            .translate(run.at.x, run.at.y)
            .and_then(|()| self.ctx.rotate(run.rotation));
        if placed.is_ok() {
            self.ctx.set_text_align(run.align.as_css());
            self.ctx.set_text_baseline(run.baseline.as_css());
            let _ = self.ctx.fill_text(&run.text, 0.0, 0.0);
        }
        self.ctx.restore();
    }

    fn measure_text(&self, text: &str, font: Option<&str>) -> TextMetrics {
        self.ctx.save();
        if let Some(font) = font {
            self.ctx.set_font(font);
        }
        let measured = self.ctx.measure_text(text);
        self.ctx.restore();
        match measured {
            Ok(m) => TextMetrics {
                width: m.width(),
                ascent: m.actual_bounding_box_ascent(),
                descent: m.actual_bounding_box_descent(),
                left: m.actual_bounding_box_left(),
            },
            Err(err) => {
                log::warn!("measureText failed: {err:?}");
                TextMetrics::default()
            }
        }
    }

    fn draw_image(&mut self, name: &str, rect: Rect) {
        let images = self.images.borrow();
        let Some(image) = images.get(name) else {
            log::trace!("image {name:?} not registered");
            return;
        };
        let _ = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
            image,
            rect.x0,
            rect.y0,
            rect.width(),
            rect.height(),
        );
    }

    fn image_size(&self, name: &str) -> Option<Size> {
        let images = self.images.borrow();
        let image = images.get(name)?;
        if !image.complete() || image.natural_width() == 0 {
            return None;
        }
        Some(Size::new(
            image.natural_width() as f64,
            image.natural_height() as f64,
        ))
    }

    fn is_point_in_path(&self, path: &BezPath, point: Point) -> bool {
        to_path2d(path)
            .map(|p| self.ctx.is_point_in_path_with_path_2d_and_f64(&p, point.x, point.y))
            .unwrap_or(false)
    }

    fn pixel_at(&self, point: Point) -> Option<[u8; 4]> {
        let data = self
            .ctx
            .get_image_data(point.x.floor(), point.y.floor(), 1.0, 1.0)
            .ok()?
            .data();
        match data.0.as_slice() {
            [r, g, b, a, ..] => Some([*r, *g, *b, *a]),
            _ => None,
        }
    }
}
