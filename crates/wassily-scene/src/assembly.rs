//! Assemblies: markings built from other markings.
//!
//! An assembly owns a hidden frame translated to its reference point. On
//! every redraw the frame is cleared and the assembly's parts are rebuilt
//! in it, relative to that point. The assembly itself has no path; picking
//! asks its parts.

use crate::element::{ElementId, ElementKind};
use crate::frame::FrameState;
use crate::marking::{Marking, Poly};
use crate::surface::Surface;
use kurbo::{Affine, Point, Vec2};
use std::f64::consts::PI;
use wassily_core::{DrawError, Result};

/// Star centered on the reference point, alternating outer and inner
/// vertices. The first outer vertex sits at `rotation_degrees`.
#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub points: usize,
    pub rotation_degrees: f64,
}

impl Star {
    /// `point_factor` is the outer radius as a multiple of the inner one.
    pub fn new(inner_radius: f64, points: usize, point_factor: f64, rotation_degrees: f64) -> Self {
        Self {
            inner_radius,
            outer_radius: inner_radius * point_factor,
            points,
            rotation_degrees,
        }
    }

    /// Vertices relative to the center.
    pub fn vertices(&self) -> Vec<Point> {
        let count = self.points * 2;
        let step = PI / self.points as f64;
        let rotation = self.rotation_degrees.to_radians();
        (0..count)
            .map(|i| {
                let radius = if i % 2 == 0 {
                    self.outer_radius
                } else {
                    self.inner_radius
                };
                let angle = i as f64 * step + rotation;
                Point::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect()
    }
}

impl Default for Star {
    fn default() -> Self {
        Self::new(1.0, 5, 1.4, 0.0)
    }
}

/// Arrow from the reference point along `vector`, with a two-barb head.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    pub vector: Vec2,
    /// Barb length in model units; `None` uses `tip_factor` of the shaft.
    pub tip_length: Option<f64>,
    pub tip_degrees: f64,
    pub tip_factor: f64,
}

impl Arrow {
    pub fn new(vector: Vec2, tip_length: Option<f64>) -> Self {
        Self {
            vector,
            tip_length,
            tip_degrees: 20.0,
            tip_factor: 0.1,
        }
    }

    /// Polyline back → tip → barb → tip → barb, relative to the back.
    /// `None` for a shaft shorter than `epsilon`.
    pub fn vertices(&self, epsilon: f64) -> Option<Vec<Point>> {
        let length = self.vector.hypot();
        if length < epsilon {
            return None;
        }
        let tip_length = self.tip_length.unwrap_or(self.tip_factor * length);
        let unit = self.vector / length;
        let perp = Vec2::new(-unit.y, unit.x);
        let (s, c) = self.tip_degrees.to_radians().sin_cos();
        let back_off = unit * (-c * tip_length);
        let side = perp * (s * tip_length);
        let tip = self.vector.to_point();
        Some(vec![
            Point::ZERO,
            tip,
            tip + back_off + side,
            tip,
            tip + back_off - side,
        ])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Assembly {
    Star(Star),
    Arrow(Arrow),
}

impl Assembly {
    pub fn tag(&self) -> &'static str {
        match self {
            Assembly::Star(_) => "Star",
            Assembly::Arrow(_) => "Arrow",
        }
    }

    /// The part to draw and whether it is stroked.
    fn part(&self, epsilon: f64) -> Option<(Marking, bool)> {
        match self {
            Assembly::Star(star) => {
                let poly = Poly {
                    points: star.vertices(),
                    closed: true,
                };
                Some((Marking::Poly(poly), false))
            }
            Assembly::Arrow(arrow) => {
                let poly = Poly {
                    points: arrow.vertices(epsilon)?,
                    closed: false,
                };
                Some((Marking::Poly(poly), true))
            }
        }
    }
}

pub struct AssemblyState {
    pub(crate) shape: Assembly,
    /// Position of the assembly's origin in its frame's model space.
    pub(crate) frame_point: Point,
    /// The hidden frame holding the parts.
    pub(crate) frame: ElementId,
}

impl AssemblyState {
    pub fn shape(&self) -> &Assembly {
        &self.shape
    }

    pub fn frame_point(&self) -> Point {
        self.frame_point
    }
}

fn translation_pair(point: Point) -> (Affine, Affine) {
    let offset = point.to_vec2();
    (Affine::translate(-offset), Affine::translate(offset))
}

impl Surface {
    fn assembly_state(&self, id: ElementId) -> Result<&AssemblyState> {
        match &self.element(id)?.kind {
            ElementKind::Assembly(state) => Ok(state),
            other => Err(DrawError::WrongKind {
                expected: "assembly",
                found: other.tag(),
            }),
        }
    }

    /// Add an assembly to a 2D frame with its origin at `point`.
    pub fn add_assembly(
        &mut self,
        frame: ElementId,
        point: Point,
        shape: Assembly,
    ) -> Result<ElementId> {
        let style = self.element(frame)?.style.clone();
        let tag = shape.tag();
        let state = AssemblyState {
            shape,
            frame_point: point,
            // replaced once the parts frame exists
            frame,
        };
        let element = self.new_element(tag, style.clone(), ElementKind::Assembly(state));
        let id = self.attach(frame, element, true)?;

        let (affine, inv) = translation_pair(point);
        let parts = self.new_element(
            "Frame",
            style,
            ElementKind::Frame(FrameState::with_affine(affine, inv)),
        );
        let parts = self.insert_node(id, parts);
        self.refresh_transforms(parts);
        if let ElementKind::Assembly(state) = &mut self.element_mut(id)?.kind {
            state.frame = parts;
        }
        Ok(id)
    }

    /// Filled star around `center`.
    pub fn star(
        &mut self,
        frame: ElementId,
        center: Point,
        inner_radius: f64,
        points: usize,
        point_factor: f64,
        rotation_degrees: f64,
    ) -> Result<ElementId> {
        let star = Star::new(inner_radius, points, point_factor, rotation_degrees);
        self.add_assembly(frame, center, Assembly::Star(star))
    }

    /// Stroked arrow from `back` to `tip`.
    pub fn arrow(
        &mut self,
        frame: ElementId,
        back: Point,
        tip: Point,
        tip_length: Option<f64>,
    ) -> Result<ElementId> {
        let arrow = Arrow::new(tip - back, tip_length);
        self.add_assembly(frame, back, Assembly::Arrow(arrow))
    }

    pub fn assembly(&self, id: ElementId) -> Result<&Assembly> {
        Ok(&self.assembly_state(id)?.shape)
    }

    /// The hidden frame an assembly draws into.
    pub fn assembly_frame(&self, id: ElementId) -> Result<ElementId> {
        Ok(self.assembly_state(id)?.frame)
    }

    /// Mutate an assembly's shape and request a redraw.
    pub fn update_assembly(&mut self, id: ElementId, f: impl FnOnce(&mut Assembly)) -> Result<()> {
        match &mut self.element_mut(id)?.kind {
            ElementKind::Assembly(state) => f(&mut state.shape),
            other => {
                return Err(DrawError::WrongKind {
                    expected: "assembly",
                    found: other.tag(),
                });
            }
        }
        self.request_redraw();
        Ok(())
    }

    /// Rebuild an assembly's parts in its frame. Runs inside a redraw.
    pub(crate) fn prepare_assembly(&mut self, id: ElementId) {
        let Ok(element) = self.element(id) else {
            return;
        };
        let ElementKind::Assembly(state) = &element.kind else {
            return;
        };
        let frame = state.frame;
        let (affine, inv) = translation_pair(state.frame_point);
        let part = state.shape.part(self.config.epsilon);
        let name = element.name;
        let mut style = element.style.clone();

        if let Err(err) = self.clear_frame(frame, false) {
            log::warn!("cannot clear parts of {id}: {err}");
            return;
        }
        if let Ok(parts) = self.element_mut(frame) {
            parts.style = style.clone();
        }
        if let Ok(state) = self.frame_state_mut(frame) {
            state.affine = affine;
            state.inv = inv;
        }
        self.refresh_transforms(frame);

        let Some((marking, stroke)) = part else {
            log::trace!("{id} has nothing to assemble");
            return;
        };
        style.stroke = stroke;
        let element = self.named_element(name, style, ElementKind::Marking(marking));
        if let Err(err) = self.attach(frame, element, false) {
            log::warn!("dropping part of {id}: {err}");
        }
    }

    /// Whether any live part of an assembly is under the canvas point.
    pub(crate) fn pick_assembly(&self, id: ElementId, canvas_point: Point) -> bool {
        let Ok(state) = self.assembly_state(id) else {
            return false;
        };
        let Ok(parts) = self.draw_order(state.frame) else {
            return false;
        };
        parts
            .iter()
            .any(|part| self.is_live(*part) && self.pick(*part, canvas_point))
    }

    pub(crate) fn set_assembly_point(&mut self, id: ElementId, point: Point) -> Result<()> {
        let frame = match &mut self.element_mut(id)?.kind {
            ElementKind::Assembly(state) => {
                state.frame_point = point;
                state.frame
            }
            other => {
                return Err(DrawError::WrongKind {
                    expected: "assembly",
                    found: other.tag(),
                });
            }
        };
        let (affine, inv) = translation_pair(point);
        let state = self.frame_state_mut(frame)?;
        state.affine = affine;
        state.inv = inv;
        self.request_redraw();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::EventKind;
    use crate::scheduler::ManualFrames;
    use pretty_assertions::assert_eq;
    use wassily_render::RecordingCanvas;

    fn surface() -> Surface {
        Surface::new(
            Box::new(RecordingCanvas::new(100.0, 100.0)),
            Box::new(ManualFrames::new()),
        )
        .unwrap()
    }

    fn assert_close(a: Point, b: Point) {
        assert!((a - b).hypot() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn star_alternates_outer_and_inner_vertices() {
        let star = Star::new(10.0, 5, 1.4, 0.0);
        let vertices = star.vertices();
        assert_eq!(vertices.len(), 10);
        assert_close(vertices[0], Point::new(14.0, 0.0));
        let angle = 36f64.to_radians();
        assert_close(vertices[1], Point::new(10.0 * angle.cos(), 10.0 * angle.sin()));

        let turned = Star::new(10.0, 4, 2.0, 90.0).vertices();
        assert_close(turned[0], Point::new(0.0, 20.0));
    }

    #[test]
    fn arrow_barbs_fold_back_from_the_tip() {
        let arrow = Arrow::new(Vec2::new(10.0, 0.0), None);
        let vertices = arrow.vertices(1e-6).unwrap();
        let (s, c) = 20f64.to_radians().sin_cos();
        assert_eq!(vertices.len(), 5);
        assert_close(vertices[0], Point::ZERO);
        assert_close(vertices[1], Point::new(10.0, 0.0));
        assert_close(vertices[2], Point::new(10.0 - c, s));
        assert_close(vertices[3], Point::new(10.0, 0.0));
        assert_close(vertices[4], Point::new(10.0 - c, -s));

        let fixed = Arrow::new(Vec2::new(0.0, 100.0), Some(5.0));
        let barb = fixed.vertices(1e-6).unwrap()[2];
        assert_close(barb, Point::new(-5.0 * s, 100.0 - 5.0 * c));
    }

    #[test]
    fn zero_length_arrow_has_no_parts() {
        let mut surface = surface();
        let root = surface.root();
        let arrow = surface.arrow(root, Point::new(5.0, 5.0), Point::new(5.0, 5.0), None).unwrap();
        surface.animation_frame();
        let parts = surface.assembly_frame(arrow).unwrap();
        assert!(surface.draw_order(parts).unwrap().is_empty());
        assert!(surface.stats().is_empty());
    }

    #[test]
    fn parts_are_drawn_at_the_frame_point() {
        let mut surface = surface();
        let root = surface.root();
        let star = surface.star(root, Point::new(50.0, 40.0), 10.0, 5, 1.4, 0.0).unwrap();
        surface.animation_frame();

        let parts = surface.assembly_frame(star).unwrap();
        assert_eq!(surface.draw_order(parts).unwrap().len(), 1);
        let max = surface.stats().max().unwrap();
        assert!((max.x - 64.0).abs() < 1e-9, "{max:?}");

        surface.set_frame_point(star, Point::new(20.0, 20.0)).unwrap();
        surface.animation_frame();
        assert_eq!(surface.frame_point(star).unwrap(), Point::new(20.0, 20.0));
        let max = surface.stats().max().unwrap();
        assert!((max.x - 34.0).abs() < 1e-9, "{max:?}");
        // rebuilt, not accumulated
        assert_eq!(surface.draw_order(parts).unwrap().len(), 1);
    }

    #[test]
    fn parts_take_the_assembly_style() {
        let mut surface = surface();
        let root = surface.root();
        let arrow = surface.arrow(root, Point::ZERO, Point::new(30.0, 0.0), None).unwrap();
        surface
            .update_style(arrow, |s| {
                s.colored("blue");
            })
            .unwrap();
        surface.animation_frame();

        let parts = surface.assembly_frame(arrow).unwrap();
        let shaft = surface.draw_order(parts).unwrap()[0];
        assert_eq!(surface.style(shaft).unwrap().color, "blue");
        assert!(surface.style(shaft).unwrap().stroke);
        assert_eq!(surface.name_of(shaft).unwrap(), surface.name_of(arrow).unwrap());
    }

    #[test]
    fn picking_delegates_to_parts() {
        let mut surface = surface();
        let root = surface.root();
        let star = surface.star(root, Point::new(50.0, 50.0), 10.0, 5, 1.4, 0.0).unwrap();
        surface
            .on_event(star, EventKind::Click, Box::new(|_, _| Ok(true)))
            .unwrap();
        // nothing assembled yet
        assert!(!surface.pick(star, Point::new(50.0, 50.0)));
        surface.animation_frame();

        assert!(surface.pick(star, Point::new(50.0, 50.0)));
        assert!(!surface.pick(star, Point::new(90.0, 90.0)));
        assert!(surface.dispatch(EventKind::Click, Point::new(50.0, 50.0)).unwrap());
        assert!(!surface.dispatch(EventKind::Click, Point::new(90.0, 90.0)).unwrap());
    }

    #[test]
    fn forgotten_assembly_is_swept_with_its_parts() {
        let mut surface = surface();
        let root = surface.root();
        let star = surface.star(root, Point::new(50.0, 50.0), 10.0, 5, 1.4, 0.0).unwrap();
        surface.animation_frame();
        let parts = surface.assembly_frame(star).unwrap();

        surface.forget(star).unwrap();
        surface.animation_frame();
        assert!(!surface.is_live(star));
        assert!(!surface.is_live(parts));
        assert!(surface.stats().is_empty());
        assert!(surface.draw_order(root).unwrap().is_empty());
    }
}
