//! WASM bridge for Wassily: draws a surface onto an HTML canvas.
//!
//! Compiled via `wasm-pack build --target web`. JavaScript holds a
//! [`WasmDiagram`], adds markings by calling its methods, and forwards
//! pointer events; redraws are scheduled with `requestAnimationFrame`.

mod animation;
mod canvas2d;

pub use animation::{AnimationFrames, SurfaceSlot};
pub use canvas2d::{ImageRegistry, WebCanvas};

use glam::DVec3;
use kurbo::{Point, Size, Vec2};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wassily_core::{DrawError, SurfaceConfig, TextAlign};
use wassily_scene::{ElementId, EventKind, Surface};
use web_sys::{HtmlCanvasElement, HtmlImageElement};

fn js_err(err: DrawError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn align_from(name: &str) -> TextAlign {
    match name {
        "center" => TextAlign::Center,
        "right" => TextAlign::Right,
        _ => TextAlign::Left,
    }
}

/// A diagram on one HTML canvas.
///
/// 2D markings go to `frame`; 3D markings need a diagram made with
/// [`WasmDiagram::cube`]. Methods return element names, which JavaScript
/// passes back to address elements.
#[wasm_bindgen]
pub struct WasmDiagram {
    surface: Rc<RefCell<Surface>>,
    frame: ElementId,
    frame3d: Option<ElementId>,
    images: ImageRegistry,
}

impl WasmDiagram {
    fn host(
        canvas: HtmlCanvasElement,
    ) -> Result<(Box<WebCanvas>, Box<AnimationFrames>, SurfaceSlot, ImageRegistry), JsValue> {
        console_error_panic_hook_setup();
        let images = ImageRegistry::default();
        let web = WebCanvas::new(canvas, images.clone())?;
        let slot = SurfaceSlot::default();
        let frames = AnimationFrames::new(slot.clone());
        Ok((Box::new(web), Box::new(frames), slot, images))
    }

    fn finish(
        surface: Surface,
        frame: ElementId,
        frame3d: Option<ElementId>,
        slot: SurfaceSlot,
        images: ImageRegistry,
    ) -> Self {
        let surface = Rc::new(RefCell::new(surface));
        slot.bind(&surface);
        surface.borrow_mut().request_redraw();
        Self {
            surface,
            frame,
            frame3d,
            images,
        }
    }

    fn with_surface<T>(
        &self,
        f: impl FnOnce(&mut Surface) -> Result<T, DrawError>,
    ) -> Result<T, JsValue> {
        let mut surface = self
            .surface
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("surface is busy"))?;
        f(&mut surface).map_err(js_err)
    }

    fn named(&self, make: impl FnOnce(&mut Surface) -> Result<ElementId, DrawError>) -> Result<String, JsValue> {
        self.with_surface(|s| {
            let id = make(s)?;
            Ok(s.name_of(id)?.to_owned())
        })
    }

    fn frame3d(&self) -> Result<ElementId, JsValue> {
        self.frame3d
            .ok_or_else(|| JsValue::from_str("diagram has no 3D frame; create it with cube()"))
    }

    fn find(&self, surface: &Surface, name: &str) -> Result<ElementId, DrawError> {
        [Some(self.frame), self.frame3d]
            .into_iter()
            .flatten()
            .find_map(|container| surface.lookup(container, name))
            .ok_or_else(|| DrawError::NotLive(name.to_owned()))
    }
}

#[wasm_bindgen]
impl WasmDiagram {
    /// A 2D diagram drawing in canvas pixels (y up). `config_json` is an
    /// optional `SurfaceConfig` in JSON.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config_json: Option<String>) -> Result<WasmDiagram, JsValue> {
        let config = match config_json {
            Some(json) => SurfaceConfig::from_json(&json).map_err(js_err)?,
            None => SurfaceConfig::default(),
        };
        let (web, frames, slot, images) = Self::host(canvas)?;
        let surface = Surface::with_config(web, frames, config).map_err(js_err)?;
        let root = surface.root();
        Ok(Self::finish(surface, root, None, slot, images))
    }

    /// A 3D diagram centered on the origin, `model_width` across.
    pub fn cube(
        canvas: HtmlCanvasElement,
        model_width: f64,
        perspective: bool,
        shrink: f64,
    ) -> Result<WasmDiagram, JsValue> {
        let (web, frames, slot, images) = Self::host(canvas)?;
        let (surface, frame3d) =
            Surface::cube(web, frames, model_width, DVec3::ZERO, perspective, shrink)
                .map_err(js_err)?;
        let frame = surface.container_of(frame3d).map_err(js_err)?;
        Ok(Self::finish(surface, frame, Some(frame3d), slot, images))
    }

    /// Register an image for `named_image`.
    pub fn add_image(&self, name: &str, image: HtmlImageElement) {
        self.images.borrow_mut().insert(name.to_owned(), image);
        if let Ok(mut surface) = self.surface.try_borrow_mut() {
            surface.request_redraw();
        }
    }

    // ─── 2D markings ─────────────────────────────────────────────────────

    pub fn circle(&self, x: f64, y: f64, radius: f64, scaled: bool) -> Result<String, JsValue> {
        let frame = self.frame;
        self.named(|s| s.circle(frame, Point::new(x, y), radius, scaled))
    }

    pub fn rect(&self, x: f64, y: f64, w: f64, h: f64, degrees: f64) -> Result<String, JsValue> {
        let frame = self.frame;
        self.named(|s| {
            s.rect(
                frame,
                Point::new(x, y),
                Size::new(w, h),
                Vec2::ZERO,
                true,
                degrees,
            )
        })
    }

    pub fn line(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<String, JsValue> {
        let frame = self.frame;
        self.named(|s| s.line(frame, Point::new(x1, y1), Point::new(x2, y2)))
    }

    /// Closed polygon from a flat `[x0, y0, x1, y1, ...]` list.
    pub fn polygon(&self, coords: Vec<f64>, fill: bool) -> Result<String, JsValue> {
        let frame = self.frame;
        let points: Vec<Point> = coords.chunks_exact(2).map(|c| Point::new(c[0], c[1])).collect();
        self.named(|s| {
            if fill {
                s.polygon(frame, &points)
            } else {
                s.poly(frame, &points)
            }
        })
    }

    pub fn text(
        &self,
        x: f64,
        y: f64,
        text: &str,
        align: &str,
        background: Option<String>,
    ) -> Result<String, JsValue> {
        let frame = self.frame;
        self.named(|s| {
            s.text_box(
                frame,
                Point::new(x, y),
                text,
                Vec2::ZERO,
                align_from(align),
                background.as_deref(),
            )
        })
    }

    pub fn image(&self, x: f64, y: f64, name: &str, w: f64, h: f64) -> Result<String, JsValue> {
        let frame = self.frame;
        let size = (w > 0.0 && h > 0.0).then(|| Size::new(w, h));
        self.named(|s| s.named_image(frame, Point::new(x, y), name, size, Vec2::ZERO, true))
    }

    pub fn star(
        &self,
        x: f64,
        y: f64,
        inner_radius: f64,
        points: Option<u32>,
        degrees: Option<f64>,
    ) -> Result<String, JsValue> {
        let frame = self.frame;
        let points = points.unwrap_or(5) as usize;
        let degrees = degrees.unwrap_or(0.0);
        self.named(|s| s.star(frame, Point::new(x, y), inner_radius, points, 1.4, degrees))
    }

    /// Arrow from `(x1, y1)` to `(x2, y2)`. A non-positive `tip_length`
    /// sizes the head from the shaft.
    pub fn arrow(&self, x1: f64, y1: f64, x2: f64, y2: f64, tip_length: f64) -> Result<String, JsValue> {
        let frame = self.frame;
        let tip_length = (tip_length > 0.0).then_some(tip_length);
        self.named(|s| s.arrow(frame, Point::new(x1, y1), Point::new(x2, y2), tip_length))
    }

    // ─── 3D markings ─────────────────────────────────────────────────────

    pub fn circle3d(&self, x: f64, y: f64, z: f64, radius: f64) -> Result<String, JsValue> {
        let f3d = self.frame3d()?;
        self.named(|s| s.circle3d(f3d, DVec3::new(x, y, z), radius, true))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn line3d(
        &self,
        x1: f64,
        y1: f64,
        z1: f64,
        x2: f64,
        y2: f64,
        z2: f64,
    ) -> Result<String, JsValue> {
        let f3d = self.frame3d()?;
        self.named(|s| s.line3d(f3d, DVec3::new(x1, y1, z1), DVec3::new(x2, y2, z2)))
    }

    /// Filled polygon from a flat `[x0, y0, z0, x1, ...]` list.
    pub fn polygon3d(&self, coords: Vec<f64>) -> Result<String, JsValue> {
        let f3d = self.frame3d()?;
        let points: Vec<DVec3> = coords
            .chunks_exact(3)
            .map(|c| DVec3::new(c[0], c[1], c[2]))
            .collect();
        self.named(|s| s.polygon3d(f3d, &points))
    }

    /// Drag on the canvas to rotate the camera.
    pub fn orbit(&self) -> Result<(), JsValue> {
        let f3d = self.frame3d()?;
        self.with_surface(|s| s.orbit(f3d))
    }

    // ─── Elements ────────────────────────────────────────────────────────

    /// Set the color (and stroke flag) of a named element, or of the
    /// drawing frame when `name` is empty.
    pub fn set_color(&self, name: &str, color: &str, stroke: bool) -> Result<(), JsValue> {
        self.with_surface(|s| {
            let id = if name.is_empty() {
                self.frame3d.unwrap_or(self.frame)
            } else {
                self.find(s, name)?
            };
            s.update_style(id, |style| {
                style.colored(color).stroke = stroke;
            })
        })
    }

    pub fn forget(&self, name: &str) -> Result<(), JsValue> {
        self.with_surface(|s| {
            let id = self.find(s, name)?;
            s.forget(id)
        })
    }

    pub fn draggable(&self, name: &str) -> Result<(), JsValue> {
        self.with_surface(|s| {
            let id = self.find(s, name)?;
            s.draggable(id)
        })
    }

    pub fn clear(&self) -> Result<(), JsValue> {
        let container = self.frame3d.unwrap_or(self.frame);
        self.with_surface(|s| s.clear(container))
    }

    pub fn fit(&self, border: f64) -> Result<(), JsValue> {
        let container = self.frame3d.unwrap_or(self.frame);
        self.with_surface(|s| s.fit(container, border))
    }

    /// Forward a DOM pointer event (`"pointerdown"`, ...) at canvas
    /// offset coordinates. Returns whether a handler claimed it.
    pub fn pointer_event(&self, kind: &str, x: f64, y: f64) -> Result<bool, JsValue> {
        let kind = EventKind::from_name(kind)
            .ok_or_else(|| JsValue::from_str(&format!("unsupported event {kind:?}")))?;
        self.with_surface(|s| s.dispatch(kind, Point::new(x, y)))
    }

    pub fn request_redraw(&self) -> Result<(), JsValue> {
        self.with_surface(|s| {
            s.request_redraw();
            Ok(())
        })
    }
}

/// Route panics to the browser console.
fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Wassily WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
