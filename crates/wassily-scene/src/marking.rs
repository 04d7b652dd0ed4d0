//! 2D markings.
//!
//! A marking turns its model-space geometry into a canvas path. Building
//! the path also feeds every reference point into the canvas stats, so the
//! same path serves painting, hit testing and fit-to-content.

use crate::element::{ElementId, ElementKind};
use crate::surface::Surface;
use kurbo::{Affine, BezPath, Circle as KurboCircle, Point, Rect, Shape, Size, Vec2};
use wassily_core::{CanvasStats, DrawError, Result, Style, TextAlign, TextBaseline};
use wassily_render::{Canvas, TextRun, paint_path, to_canvas};

/// Flattening tolerance for arcs, in pixels.
const ARC_TOLERANCE: f64 = 0.1;

// ─── Path building context ───────────────────────────────────────────────

/// Everything a marking needs to build its path.
pub struct PathContext<'a> {
    pub canvas: &'a dyn Canvas,
    pub stats: &'a mut CanvasStats,
    /// Owning frame's model → cartesian pixel transform.
    pub model_to_pixel: Affine,
    pub style: &'a Style,
    /// Text box height as a multiple of the glyph height.
    pub text_padding: f64,
}

impl PathContext<'_> {
    /// Model point → cartesian pixel, without touching the stats.
    pub fn to_pixel(&self, model: Point) -> Point {
        self.model_to_pixel * model
    }

    /// Cartesian pixel → canvas pixel.
    pub fn to_canvas(&self, pixel: Point) -> Point {
        to_canvas(pixel, self.canvas.height())
    }

    /// Record a model point in the stats; returns its canvas position.
    pub fn add_point(&mut self, model: Point) -> Point {
        let pixel = self.to_pixel(model);
        self.stats.add_point(pixel);
        self.to_canvas(pixel)
    }

    /// Record a cartesian pixel in the stats.
    pub fn add_pixel_point(&mut self, pixel: Point) {
        self.stats.add_point(pixel);
    }
}

/// A canvas plus path context, handed to [`Drawable::draw`] with the
/// marking's style already applied.
pub struct Painter<'a> {
    pub canvas: &'a mut dyn Canvas,
    pub stats: &'a mut CanvasStats,
    pub model_to_pixel: Affine,
    pub style: &'a Style,
    pub text_padding: f64,
}

impl Painter<'_> {
    pub fn path_context(&mut self) -> PathContext<'_> {
        PathContext {
            canvas: &*self.canvas,
            stats: &mut *self.stats,
            model_to_pixel: self.model_to_pixel,
            style: self.style,
            text_padding: self.text_padding,
        }
    }
}

/// The contract every 2D marking implements.
pub trait Drawable {
    /// Type tag used for generated names (`Circle`, `Rect`, ...).
    fn tag(&self) -> &'static str;

    /// Canvas path for painting and hit testing.
    fn draw_path(&self, cx: &mut PathContext<'_>) -> Result<BezPath>;

    /// Paint the marking. The default strokes or fills [`Drawable::draw_path`].
    fn draw(&self, painter: &mut Painter<'_>) -> Result<()> {
        let path = self.draw_path(&mut painter.path_context())?;
        paint_path(&mut *painter.canvas, &path, painter.style);
        Ok(())
    }

    /// Reference point used for drag-style repositioning.
    fn frame_point(&self) -> Point;
    fn set_frame_point(&mut self, point: Point);
}

// ─── Shapes ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
    /// Radius in model units (true) or pixels (false).
    pub scaled: bool,
}

impl Drawable for Circle {
    fn tag(&self) -> &'static str {
        "Circle"
    }

    fn draw_path(&self, cx: &mut PathContext<'_>) -> Result<BezPath> {
        let center = cx.add_point(self.center);
        let radius = if self.scaled {
            let edge = cx.add_point(self.center + Vec2::new(self.radius, 0.0));
            (edge - center).hypot()
        } else {
            self.radius
        };
        let cartesian = cx.to_pixel(self.center);
        for (dx, dy) in [(radius, 0.0), (0.0, radius), (-radius, 0.0), (0.0, -radius)] {
            cx.add_pixel_point(cartesian + Vec2::new(dx, dy));
        }
        Ok(KurboCircle::new(center, radius).to_path(ARC_TOLERANCE))
    }

    fn frame_point(&self) -> Point {
        self.center
    }

    fn set_frame_point(&mut self, point: Point) {
        self.center = point;
    }
}

/// Axis-aligned box (before rotation) from a reference point.
#[derive(Debug, Clone, PartialEq)]
pub struct RectMarking {
    pub point: Point,
    pub size: Option<Size>,
    /// Lower-left corner relative to `point`.
    pub offset: Vec2,
    /// Size and offset in model units (true) or pixels (false).
    pub scaled: bool,
    /// Counterclockwise rotation about `point`.
    pub rotation_degrees: f64,
}

impl RectMarking {
    pub fn new(point: Point, size: Size) -> Self {
        Self {
            point,
            size: Some(size),
            offset: Vec2::ZERO,
            scaled: true,
            rotation_degrees: 0.0,
        }
    }

    /// Centered, unscaled square of `size` pixels.
    pub fn square(point: Point, size: f64) -> Self {
        Self {
            offset: Vec2::new(-size / 2.0, -size / 2.0),
            scaled: false,
            ..Self::new(point, Size::new(size, size))
        }
    }
}

impl Drawable for RectMarking {
    fn tag(&self) -> &'static str {
        "Rect"
    }

    fn draw_path(&self, cx: &mut PathContext<'_>) -> Result<BezPath> {
        let size = self
            .size
            .ok_or_else(|| DrawError::MissingSize(self.tag().into()))?;
        let bounds = pixel_box(cx, self.point, self.offset, size, self.scaled);
        let pivot = cx.to_pixel(self.point);
        Ok(box_path(cx, bounds, pivot, self.rotation_degrees))
    }

    fn frame_point(&self) -> Point {
        self.point
    }

    fn set_frame_point(&mut self, point: Point) {
        self.point = point;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Poly {
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Drawable for Poly {
    fn tag(&self) -> &'static str {
        "Poly"
    }

    fn draw_path(&self, cx: &mut PathContext<'_>) -> Result<BezPath> {
        let points: Vec<Point> = self.points.iter().map(|p| cx.add_point(*p)).collect();
        Ok(polygon_path(&points, self.closed))
    }

    fn frame_point(&self) -> Point {
        self.points.first().copied().unwrap_or(Point::ZERO)
    }

    fn set_frame_point(&mut self, point: Point) {
        let delta = point - self.frame_point();
        for p in &mut self.points {
            *p += delta;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub start: Point,
    pub end: Point,
}

impl Drawable for Line {
    fn tag(&self) -> &'static str {
        "Line"
    }

    fn draw_path(&self, cx: &mut PathContext<'_>) -> Result<BezPath> {
        let start = cx.add_point(self.start);
        let end = cx.add_point(self.end);
        Ok(polygon_path(&[start, end], false))
    }

    fn frame_point(&self) -> Point {
        self.start
    }

    fn set_frame_point(&mut self, point: Point) {
        let delta = point - self.start;
        self.start = point;
        self.end += delta;
    }
}

/// Text anchored at a model point; the path is its (optional) background box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub point: Point,
    pub text: String,
    /// Model-space shift applied to the anchor.
    pub shift: Vec2,
    pub align: TextAlign,
    pub baseline: TextBaseline,
    pub background: Option<String>,
    pub rotation_degrees: f64,
}

impl TextBox {
    pub fn new(point: Point, text: impl Into<String>) -> Self {
        Self {
            point,
            text: text.into(),
            shift: Vec2::ZERO,
            align: TextAlign::default(),
            baseline: TextBaseline::default(),
            background: None,
            rotation_degrees: 0.0,
        }
    }

    /// Anchor in cartesian pixels and the unrotated background box.
    fn geometry(&self, cx: &PathContext<'_>) -> (Point, Rect) {
        let metrics = cx.canvas.measure_text(&self.text, cx.style.font.as_deref());
        let height = metrics.height();
        let mut offset = Vec2::new(-metrics.left, -metrics.descent);
        match self.align {
            TextAlign::Left => {}
            TextAlign::Center => offset.x -= metrics.width / 2.0,
            TextAlign::Right => offset.x -= metrics.width,
        }
        match self.baseline {
            TextBaseline::Top => offset.y -= height,
            TextBaseline::Middle => offset.y -= height / 2.0,
            TextBaseline::Alphabetic | TextBaseline::Bottom => {}
        }
        let anchor = cx.to_pixel(self.point + self.shift);
        let size = Size::new(metrics.width, height * cx.text_padding);
        (anchor, Rect::from_origin_size(anchor + offset, size))
    }
}

impl Drawable for TextBox {
    fn tag(&self) -> &'static str {
        "TextBox"
    }

    fn draw_path(&self, cx: &mut PathContext<'_>) -> Result<BezPath> {
        let (anchor, bounds) = self.geometry(cx);
        Ok(box_path(cx, bounds, anchor, self.rotation_degrees))
    }

    fn draw(&self, painter: &mut Painter<'_>) -> Result<()> {
        let mut cx = painter.path_context();
        let (anchor, _) = self.geometry(&cx);
        let path = self.draw_path(&mut cx)?;
        let at = cx.to_canvas(anchor);

        if let Some(background) = &self.background {
            painter.canvas.set_color(background);
            painter.canvas.fill(&path);
            painter.canvas.set_color(&painter.style.color);
        }
        painter.canvas.fill_text(&TextRun {
            text: self.text.clone(),
            at,
            align: self.align,
            baseline: self.baseline,
            rotation: -self.rotation_degrees.to_radians(),
        });
        Ok(())
    }

    fn frame_point(&self) -> Point {
        self.point
    }

    fn set_frame_point(&mut self, point: Point) {
        self.point = point;
    }
}

/// A registered image. Without an explicit size the image's natural size
/// is used; until that is known the marking draws nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMarking {
    pub point: Point,
    pub name: String,
    pub size: Option<Size>,
    pub offset: Vec2,
    pub scaled: bool,
}

impl ImageMarking {
    fn pixel_bounds(&self, cx: &PathContext<'_>) -> Option<Rect> {
        let size = self.size.or_else(|| cx.canvas.image_size(&self.name))?;
        Some(pixel_box(cx, self.point, self.offset, size, self.scaled))
    }
}

impl Drawable for ImageMarking {
    fn tag(&self) -> &'static str {
        "Image"
    }

    fn draw_path(&self, cx: &mut PathContext<'_>) -> Result<BezPath> {
        match self.pixel_bounds(cx) {
            Some(bounds) => {
                let pivot = cx.to_pixel(self.point);
                Ok(box_path(cx, bounds, pivot, 0.0))
            }
            None => Ok(BezPath::new()),
        }
    }

    fn draw(&self, painter: &mut Painter<'_>) -> Result<()> {
        let mut cx = painter.path_context();
        let Some(bounds) = self.pixel_bounds(&cx) else {
            log::trace!("image {:?} not loaded yet", self.name);
            return Ok(());
        };
        self.draw_path(&mut cx)?;
        let height = painter.canvas.height();
        let target = Rect::new(bounds.x0, height - bounds.y1, bounds.x1, height - bounds.y0);
        painter.canvas.draw_image(&self.name, target);
        Ok(())
    }

    fn frame_point(&self) -> Point {
        self.point
    }

    fn set_frame_point(&mut self, point: Point) {
        self.point = point;
    }
}

/// Any 2D marking held by a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Marking {
    Circle(Circle),
    Rect(RectMarking),
    Poly(Poly),
    Line(Line),
    Text(TextBox),
    Image(ImageMarking),
}

impl Marking {
    pub fn drawable(&self) -> &dyn Drawable {
        match self {
            Marking::Circle(m) => m,
            Marking::Rect(m) => m,
            Marking::Poly(m) => m,
            Marking::Line(m) => m,
            Marking::Text(m) => m,
            Marking::Image(m) => m,
        }
    }

    pub fn drawable_mut(&mut self) -> &mut dyn Drawable {
        match self {
            Marking::Circle(m) => m,
            Marking::Rect(m) => m,
            Marking::Poly(m) => m,
            Marking::Line(m) => m,
            Marking::Text(m) => m,
            Marking::Image(m) => m,
        }
    }
}

// ─── Geometry helpers ────────────────────────────────────────────────────

/// Cartesian pixel box for a reference point, offset and size.
fn pixel_box(cx: &PathContext<'_>, point: Point, offset: Vec2, size: Size, scaled: bool) -> Rect {
    let (a, b) = if scaled {
        let lower_left = point + offset;
        (cx.to_pixel(lower_left), cx.to_pixel(lower_left + size.to_vec2()))
    } else {
        let lower_left = cx.to_pixel(point) + offset;
        (lower_left, lower_left + size.to_vec2())
    };
    Rect::from_points(a, b)
}

/// Closed path around `bounds` rotated about `pivot` (both cartesian);
/// the corners go into the stats.
fn box_path(cx: &mut PathContext<'_>, bounds: Rect, pivot: Point, degrees: f64) -> BezPath {
    let rotate = Affine::rotate_about(degrees.to_radians(), pivot);
    let corners = [
        Point::new(bounds.x0, bounds.y0),
        Point::new(bounds.x1, bounds.y0),
        Point::new(bounds.x1, bounds.y1),
        Point::new(bounds.x0, bounds.y1),
    ]
    .map(|corner| {
        let pixel = rotate * corner;
        cx.add_pixel_point(pixel);
        cx.to_canvas(pixel)
    });
    polygon_path(&corners, true)
}

fn polygon_path(points: &[Point], closed: bool) -> BezPath {
    let mut path = BezPath::new();
    let Some((first, rest)) = points.split_first() else {
        return path;
    };
    path.move_to(*first);
    for p in rest {
        path.line_to(*p);
    }
    if closed {
        path.close_path();
    }
    path
}

// ─── Surface API ─────────────────────────────────────────────────────────

impl Surface {
    /// Circle at `center`; `scaled` radii are in model units.
    pub fn circle(
        &mut self,
        frame: ElementId,
        center: Point,
        radius: f64,
        scaled: bool,
    ) -> Result<ElementId> {
        let circle = Circle {
            center,
            radius,
            scaled,
        };
        self.add_marking(frame, Marking::Circle(circle))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rect(
        &mut self,
        frame: ElementId,
        point: Point,
        size: Size,
        offset: Vec2,
        scaled: bool,
        rotation_degrees: f64,
    ) -> Result<ElementId> {
        let rect = RectMarking {
            point,
            size: Some(size),
            offset,
            scaled,
            rotation_degrees,
        };
        self.add_marking(frame, Marking::Rect(rect))
    }

    /// Pixel-sized square centered on `point`.
    pub fn square(&mut self, frame: ElementId, point: Point, size: f64) -> Result<ElementId> {
        self.add_marking(frame, Marking::Rect(RectMarking::square(point, size)))
    }

    /// Closed, stroked polygon.
    pub fn poly(&mut self, frame: ElementId, points: &[Point]) -> Result<ElementId> {
        self.poly_styled(frame, points, true, true)
    }

    /// Closed, filled polygon.
    pub fn polygon(&mut self, frame: ElementId, points: &[Point]) -> Result<ElementId> {
        self.poly_styled(frame, points, true, false)
    }

    /// Open, stroked polyline.
    pub fn polyline(&mut self, frame: ElementId, points: &[Point]) -> Result<ElementId> {
        self.poly_styled(frame, points, false, true)
    }

    fn poly_styled(
        &mut self,
        frame: ElementId,
        points: &[Point],
        closed: bool,
        stroke: bool,
    ) -> Result<ElementId> {
        let poly = Poly {
            points: points.to_vec(),
            closed,
        };
        self.add_marking_stroked(frame, Marking::Poly(poly), Some(stroke))
    }

    /// Stroked line segment.
    pub fn line(&mut self, frame: ElementId, start: Point, end: Point) -> Result<ElementId> {
        self.add_marking_stroked(frame, Marking::Line(Line { start, end }), Some(true))
    }

    pub fn text_box(
        &mut self,
        frame: ElementId,
        point: Point,
        text: &str,
        shift: Vec2,
        align: TextAlign,
        background: Option<&str>,
    ) -> Result<ElementId> {
        let text_box = TextBox {
            shift,
            align,
            background: background.map(str::to_owned),
            ..TextBox::new(point, text)
        };
        self.add_marking(frame, Marking::Text(text_box))
    }

    /// Image registered on the canvas under `name`.
    pub fn named_image(
        &mut self,
        frame: ElementId,
        point: Point,
        name: &str,
        size: Option<Size>,
        offset: Vec2,
        scaled: bool,
    ) -> Result<ElementId> {
        let image = ImageMarking {
            point,
            name: name.to_owned(),
            size,
            offset,
            scaled,
        };
        self.add_marking(frame, Marking::Image(image))
    }

    pub fn marking(&self, id: ElementId) -> Result<&Marking> {
        match &self.element(id)?.kind {
            ElementKind::Marking(m) => Ok(m),
            other => Err(DrawError::WrongKind {
                expected: "marking",
                found: other.tag(),
            }),
        }
    }

    /// Mutate a marking's geometry and request a redraw.
    pub fn update_marking(&mut self, id: ElementId, f: impl FnOnce(&mut Marking)) -> Result<()> {
        match &mut self.element_mut(id)?.kind {
            ElementKind::Marking(m) => f(m),
            other => {
                return Err(DrawError::WrongKind {
                    expected: "marking",
                    found: other.tag(),
                });
            }
        }
        self.request_redraw();
        Ok(())
    }

    /// The canvas path a marking would draw right now, built against
    /// scratch stats. Markings on a frame whose transforms are stale use
    /// the transforms of the last redraw.
    pub fn marking_path(&self, id: ElementId) -> Result<BezPath> {
        let element = self.element(id)?;
        let ElementKind::Marking(marking) = &element.kind else {
            return Err(DrawError::WrongKind {
                expected: "marking",
                found: element.kind.tag(),
            });
        };
        let frame = self.container_of(id)?;
        let model_to_pixel = self.frame_state(frame)?.model_to_pixel;
        let mut scratch = CanvasStats::new();
        let mut cx = PathContext {
            canvas: &*self.canvas,
            stats: &mut scratch,
            model_to_pixel,
            style: &element.style,
            text_padding: self.config.text_padding,
        };
        marking.drawable().draw_path(&mut cx)
    }

    /// Whether the canvas point falls inside the marking's path, or
    /// inside any part of an assembly.
    pub fn pick(&self, id: ElementId, canvas_point: Point) -> bool {
        if let Ok(ElementKind::Assembly(_)) = self.element(id).map(|e| &e.kind) {
            return self.pick_assembly(id, canvas_point);
        }
        match self.marking_path(id) {
            Ok(path) => self.canvas.is_point_in_path(&path, canvas_point),
            Err(err) => {
                log::warn!("pick on {id} failed: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wassily_render::RecordingCanvas;

    fn with_cx<T>(canvas: &RecordingCanvas, m2p: Affine, f: impl FnOnce(&mut PathContext<'_>) -> T) -> (T, CanvasStats) {
        let style = Style::default();
        let mut stats = CanvasStats::new();
        let result = {
            let mut cx = PathContext {
                canvas,
                stats: &mut stats,
                model_to_pixel: m2p,
                style: &style,
                text_padding: 1.5,
            };
            f(&mut cx)
        };
        (result, stats)
    }

    #[test]
    fn scaled_circle_reports_extreme_points() {
        let canvas = RecordingCanvas::new(100.0, 100.0);
        let circle = Circle {
            center: Point::new(3.0, 7.0),
            radius: 1.0,
            scaled: true,
        };
        let (path, stats) = with_cx(&canvas, Affine::scale(10.0), |cx| circle.draw_path(cx));
        let path = path.unwrap();
        assert_eq!(stats.min(), Some(Point::new(20.0, 60.0)));
        assert_eq!(stats.max(), Some(Point::new(40.0, 80.0)));
        // canvas center is flipped: (30, 100 - 70)
        assert!(canvas.is_point_in_path(&path, Point::new(30.0, 30.0)));
        assert!(!canvas.is_point_in_path(&path, Point::new(30.0, 70.0)));
    }

    #[test]
    fn unscaled_rect_offsets_in_pixels() {
        let canvas = RecordingCanvas::new(100.0, 100.0);
        let rect = RectMarking::square(Point::new(1.0, 1.0), 4.0);
        let (_, stats) = with_cx(&canvas, Affine::scale(10.0), |cx| rect.draw_path(cx));
        assert_eq!(stats.min(), Some(Point::new(8.0, 8.0)));
        assert_eq!(stats.max(), Some(Point::new(12.0, 12.0)));
    }

    #[test]
    fn rotated_rect_turns_about_its_point() {
        let canvas = RecordingCanvas::new(100.0, 100.0);
        let rect = RectMarking {
            rotation_degrees: 90.0,
            ..RectMarking::new(Point::new(10.0, 10.0), Size::new(20.0, 5.0))
        };
        let (_, stats) = with_cx(&canvas, Affine::IDENTITY, |cx| rect.draw_path(cx));
        let min = stats.min().unwrap();
        let max = stats.max().unwrap();
        assert!((min - Point::new(5.0, 10.0)).hypot() < 1e-9, "{min:?}");
        assert!((max - Point::new(10.0, 30.0)).hypot() < 1e-9, "{max:?}");
    }

    #[test]
    fn rect_without_size_is_an_error() {
        let canvas = RecordingCanvas::new(10.0, 10.0);
        let rect = RectMarking {
            size: None,
            ..RectMarking::new(Point::ZERO, Size::ZERO)
        };
        let (result, _) = with_cx(&canvas, Affine::IDENTITY, |cx| rect.draw_path(cx));
        assert_eq!(result, Err(DrawError::MissingSize("Rect".into())));
    }

    #[test]
    fn centered_text_box_straddles_anchor() {
        let canvas = RecordingCanvas::new(200.0, 200.0);
        let text = TextBox {
            align: TextAlign::Center,
            ..TextBox::new(Point::new(50.0, 50.0), "abcd")
        };
        let (_, stats) = with_cx(&canvas, Affine::IDENTITY, |cx| text.draw_path(cx));
        // 4 glyphs × 6px wide, 10px tall with 1.5 padding, 2px descent
        assert_eq!(stats.min(), Some(Point::new(38.0, 48.0)));
        assert_eq!(stats.max(), Some(Point::new(62.0, 63.0)));
    }

    #[test]
    fn unloaded_image_has_empty_path() {
        let canvas = RecordingCanvas::new(10.0, 10.0);
        let image = ImageMarking {
            point: Point::ZERO,
            name: "pending".into(),
            size: None,
            offset: Vec2::ZERO,
            scaled: false,
        };
        let (path, stats) = with_cx(&canvas, Affine::IDENTITY, |cx| image.draw_path(cx));
        assert_eq!(path, Ok(BezPath::new()));
        assert!(stats.is_empty());

        let canvas = canvas.with_image("pending", Size::new(3.0, 2.0));
        let (_, stats) = with_cx(&canvas, Affine::IDENTITY, |cx| image.draw_path(cx));
        assert_eq!(stats.max(), Some(Point::new(3.0, 2.0)));
    }

    #[test]
    fn moving_a_line_keeps_its_length() {
        let mut line = Line {
            start: Point::new(0.0, 0.0),
            end: Point::new(3.0, 4.0),
        };
        line.set_frame_point(Point::new(1.0, 1.0));
        assert_eq!(line.end, Point::new(4.0, 5.0));
    }
}
