//! 3D markings and their projection onto 2D markings.

use crate::element::{ElementId, ElementKind};
use crate::marking::{Circle, ImageMarking, Line, Marking, Poly, RectMarking, TextBox};
use crate::surface::Surface;
use glam::DVec3;
use kurbo::{Point, Size, Vec2};
use smallvec::SmallVec;
use wassily_core::{DrawError, Projector, Result, TextAlign};

/// Geometry of a 3D marking in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape3d {
    Circle {
        center: DVec3,
        radius: f64,
        scaled: bool,
    },
    Line {
        start: DVec3,
        end: DVec3,
    },
    Poly {
        points: Vec<DVec3>,
        closed: bool,
    },
    Rect {
        point: DVec3,
        size: Size,
        offset: Vec2,
        scaled: bool,
        rotation_degrees: f64,
    },
    Text {
        point: DVec3,
        text: String,
        shift: Vec2,
        align: TextAlign,
        background: Option<String>,
    },
    Image {
        point: DVec3,
        name: String,
        size: Option<Size>,
        offset: Vec2,
        scaled: bool,
    },
}

fn flat(p: DVec3) -> Point {
    Point::new(p.x, p.y)
}

impl Shape3d {
    pub fn tag(&self) -> &'static str {
        match self {
            Shape3d::Circle { .. } => "Circle3d",
            Shape3d::Line { .. } => "Line3d",
            Shape3d::Poly { .. } => "Poly3d",
            Shape3d::Rect { .. } => "Rect3d",
            Shape3d::Text { .. } => "TextBox3d",
            Shape3d::Image { .. } => "Image3d",
        }
    }

    /// The equivalent 2D marking and its depth key.
    ///
    /// Lines use the depth of their midpoint, polygons the mean depth of
    /// their vertices, everything else the depth of its anchor point.
    /// Scaled sizes shrink or grow with distance from the eye.
    pub fn project(&self, projector: &Projector) -> (f64, Marking) {
        match self {
            Shape3d::Circle {
                center,
                radius,
                scaled,
            } => {
                let p = projector.project(*center);
                let radius = if *scaled {
                    radius * projector.distance_scale(*center)
                } else {
                    *radius
                };
                let circle = Circle {
                    center: flat(p),
                    radius,
                    scaled: *scaled,
                };
                (p.z, Marking::Circle(circle))
            }
            Shape3d::Line { start, end } => {
                let (a, b) = (projector.project(*start), projector.project(*end));
                let line = Line {
                    start: flat(a),
                    end: flat(b),
                };
                ((a.z + b.z) / 2.0, Marking::Line(line))
            }
            Shape3d::Poly { points, closed } => {
                let projected: SmallVec<[DVec3; 8]> =
                    points.iter().map(|p| projector.project(*p)).collect();
                let depth = if projected.is_empty() {
                    0.0
                } else {
                    projected.iter().map(|p| p.z).sum::<f64>() / projected.len() as f64
                };
                let poly = Poly {
                    points: projected.iter().map(|p| flat(*p)).collect(),
                    closed: *closed,
                };
                (depth, Marking::Poly(poly))
            }
            Shape3d::Rect {
                point,
                size,
                offset,
                scaled,
                rotation_degrees,
            } => {
                let p = projector.project(*point);
                let scale = if *scaled {
                    projector.distance_scale(*point)
                } else {
                    1.0
                };
                let rect = RectMarking {
                    point: flat(p),
                    size: Some(*size * scale),
                    offset: *offset * scale,
                    scaled: *scaled,
                    rotation_degrees: *rotation_degrees,
                };
                (p.z, Marking::Rect(rect))
            }
            Shape3d::Text {
                point,
                text,
                shift,
                align,
                background,
            } => {
                let p = projector.project(*point);
                let text = TextBox {
                    shift: *shift,
                    align: *align,
                    background: background.clone(),
                    ..TextBox::new(flat(p), text.clone())
                };
                (p.z, Marking::Text(text))
            }
            Shape3d::Image {
                point,
                name,
                size,
                offset,
                scaled,
            } => {
                let p = projector.project(*point);
                let scale = if *scaled {
                    projector.distance_scale(*point)
                } else {
                    1.0
                };
                let image = ImageMarking {
                    point: flat(p),
                    name: name.clone(),
                    size: size.map(|s| s * scale),
                    offset: *offset * scale,
                    scaled: *scaled,
                };
                (p.z, Marking::Image(image))
            }
        }
    }

    /// Anchor point (first vertex for polygons, start for lines).
    pub fn frame_point(&self) -> DVec3 {
        match self {
            Shape3d::Circle { center, .. } => *center,
            Shape3d::Line { start, .. } => *start,
            Shape3d::Poly { points, .. } => points.first().copied().unwrap_or(DVec3::ZERO),
            Shape3d::Rect { point, .. }
            | Shape3d::Text { point, .. }
            | Shape3d::Image { point, .. } => *point,
        }
    }

    /// Translate the shape so its anchor lands on `to`.
    pub fn set_frame_point(&mut self, to: DVec3) {
        let delta = to - self.frame_point();
        match self {
            Shape3d::Circle { center, .. } => *center += delta,
            Shape3d::Line { start, end } => {
                *start += delta;
                *end += delta;
            }
            Shape3d::Poly { points, .. } => {
                for p in points {
                    *p += delta;
                }
            }
            Shape3d::Rect { point, .. }
            | Shape3d::Text { point, .. }
            | Shape3d::Image { point, .. } => *point += delta,
        }
    }
}

/// A 3D marking held by a 3D frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Marking3dState {
    pub(crate) shape: Shape3d,
    /// Depth from the most recent projection.
    pub(crate) depth: Option<f64>,
}

impl Marking3dState {
    pub fn shape(&self) -> &Shape3d {
        &self.shape
    }
}

impl Surface {
    /// Add a 3D marking, inheriting the 3D frame's style.
    pub fn add_marking3d(&mut self, frame3d: ElementId, shape: Shape3d) -> Result<ElementId> {
        self.add_marking3d_stroked(frame3d, shape, None)
    }

    fn add_marking3d_stroked(
        &mut self,
        frame3d: ElementId,
        shape: Shape3d,
        stroke: Option<bool>,
    ) -> Result<ElementId> {
        let mut style = self.element(frame3d)?.style.clone();
        if let Some(stroke) = stroke {
            style.stroke = stroke;
        }
        let tag = shape.tag();
        let state = Marking3dState { shape, depth: None };
        let element = self.new_element(tag, style, ElementKind::Marking3d(state));
        self.attach3d(frame3d, element)
    }

    pub fn circle3d(
        &mut self,
        frame3d: ElementId,
        center: DVec3,
        radius: f64,
        scaled: bool,
    ) -> Result<ElementId> {
        let shape = Shape3d::Circle {
            center,
            radius,
            scaled,
        };
        self.add_marking3d(frame3d, shape)
    }

    /// Stroked 3D segment.
    pub fn line3d(&mut self, frame3d: ElementId, start: DVec3, end: DVec3) -> Result<ElementId> {
        self.add_marking3d_stroked(frame3d, Shape3d::Line { start, end }, Some(true))
    }

    /// Closed, stroked 3D polygon.
    pub fn poly3d(&mut self, frame3d: ElementId, points: &[DVec3]) -> Result<ElementId> {
        self.poly3d_styled(frame3d, points, true, true)
    }

    /// Closed, filled 3D polygon.
    pub fn polygon3d(&mut self, frame3d: ElementId, points: &[DVec3]) -> Result<ElementId> {
        self.poly3d_styled(frame3d, points, true, false)
    }

    /// Open, stroked 3D polyline.
    pub fn polyline3d(&mut self, frame3d: ElementId, points: &[DVec3]) -> Result<ElementId> {
        self.poly3d_styled(frame3d, points, false, true)
    }

    fn poly3d_styled(
        &mut self,
        frame3d: ElementId,
        points: &[DVec3],
        closed: bool,
        stroke: bool,
    ) -> Result<ElementId> {
        let shape = Shape3d::Poly {
            points: points.to_vec(),
            closed,
        };
        self.add_marking3d_stroked(frame3d, shape, Some(stroke))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rect3d(
        &mut self,
        frame3d: ElementId,
        point: DVec3,
        size: Size,
        offset: Vec2,
        scaled: bool,
        rotation_degrees: f64,
    ) -> Result<ElementId> {
        let shape = Shape3d::Rect {
            point,
            size,
            offset,
            scaled,
            rotation_degrees,
        };
        self.add_marking3d(frame3d, shape)
    }

    pub fn text_box3d(
        &mut self,
        frame3d: ElementId,
        point: DVec3,
        text: &str,
        shift: Vec2,
        align: TextAlign,
        background: Option<&str>,
    ) -> Result<ElementId> {
        let shape = Shape3d::Text {
            point,
            text: text.to_owned(),
            shift,
            align,
            background: background.map(str::to_owned),
        };
        self.add_marking3d(frame3d, shape)
    }

    pub fn image3d(
        &mut self,
        frame3d: ElementId,
        point: DVec3,
        name: &str,
        size: Option<Size>,
        offset: Vec2,
        scaled: bool,
    ) -> Result<ElementId> {
        let shape = Shape3d::Image {
            point,
            name: name.to_owned(),
            size,
            offset,
            scaled,
        };
        self.add_marking3d(frame3d, shape)
    }

    pub fn marking3d(&self, id: ElementId) -> Result<&Marking3dState> {
        match &self.element(id)?.kind {
            ElementKind::Marking3d(state) => Ok(state),
            other => Err(DrawError::WrongKind {
                expected: "3D marking",
                found: other.tag(),
            }),
        }
    }

    /// Mutate a 3D marking's geometry and request a redraw.
    pub fn update_marking3d(&mut self, id: ElementId, f: impl FnOnce(&mut Shape3d)) -> Result<()> {
        match &mut self.element_mut(id)?.kind {
            ElementKind::Marking3d(state) => f(&mut state.shape),
            other => {
                return Err(DrawError::WrongKind {
                    expected: "3D marking",
                    found: other.tag(),
                });
            }
        }
        self.request_redraw();
        Ok(())
    }

    /// Depth key from the last projection. Fails before the first redraw
    /// that projected the marking.
    pub fn depth(&self, id: ElementId) -> Result<f64> {
        self.marking3d(id)?
            .depth
            .ok_or_else(|| DrawError::DepthNotProjected(self.name_of(id).unwrap_or("?").to_owned()))
    }
}
