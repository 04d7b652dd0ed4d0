//! Nested coordinate frames.
//!
//! A frame's `affine` maps its parent's model space into its own. The
//! composite transforms to and from cartesian pixels are derived top-down
//! on every redraw, so between a transform change and the next redraw they
//! describe the previous layout.

use crate::drag::DragState;
use crate::element::{ElementId, ElementKind};
use crate::surface::Surface;
use kurbo::{Affine, Point};
use petgraph::stable_graph::NodeIndex;
use std::collections::HashMap;
use wassily_core::affine::{checked_region_map, invert, translation};
use wassily_core::{DrawError, Name, Result};

#[derive(Debug, Clone)]
pub struct FrameState {
    /// Parent model space → this frame's model space.
    pub(crate) affine: Affine,
    pub(crate) inv: Affine,
    /// Cartesian pixel → model.
    pub(crate) pixel_to_model: Affine,
    /// Model → cartesian pixel.
    pub(crate) model_to_pixel: Affine,
    pub(crate) draw_order: Vec<ElementId>,
    pub(crate) names: HashMap<Name, ElementId>,
    pub(crate) drag: Option<DragState>,
}

impl Default for FrameState {
    fn default() -> Self {
        Self::with_affine(Affine::IDENTITY, Affine::IDENTITY)
    }
}

impl FrameState {
    /// A frame whose parent is pixel space itself.
    pub(crate) fn with_affine(affine: Affine, inv: Affine) -> Self {
        Self {
            affine,
            inv,
            pixel_to_model: affine,
            model_to_pixel: inv,
            draw_order: Vec::new(),
            names: HashMap::new(),
            drag: None,
        }
    }

    fn recompute(&mut self, parent_p2m: Affine, parent_m2p: Affine) {
        self.pixel_to_model = self.affine * parent_p2m;
        self.model_to_pixel = parent_m2p * self.inv;
    }

    pub fn affine(&self) -> Affine {
        self.affine
    }

    pub fn pixel_to_model(&self) -> Affine {
        self.pixel_to_model
    }

    pub fn model_to_pixel(&self) -> Affine {
        self.model_to_pixel
    }

    pub fn draw_order(&self) -> &[ElementId] {
        &self.draw_order
    }
}

impl Surface {
    pub(crate) fn frame_state(&self, id: ElementId) -> Result<&FrameState> {
        match &self.element(id)?.kind {
            ElementKind::Frame(state) => Ok(state),
            other => Err(DrawError::WrongKind {
                expected: "frame",
                found: other.tag(),
            }),
        }
    }

    pub(crate) fn frame_state_mut(&mut self, id: ElementId) -> Result<&mut FrameState> {
        match &mut self.element_mut(id)?.kind {
            ElementKind::Frame(state) => Ok(state),
            other => Err(DrawError::WrongKind {
                expected: "frame",
                found: other.tag(),
            }),
        }
    }

    /// Composite transforms of the nearest enclosing 2D frame. A 3D
    /// frame's drawing frame takes them from the 3D frame's container.
    fn parent_transforms(&self, index: NodeIndex) -> (Affine, Affine) {
        let mut current = self.parent_index(index);
        while let Some(parent) = current {
            if let Some(element) = self.graph.node_weight(parent)
                && let ElementKind::Frame(state) = &element.kind
            {
                return (state.pixel_to_model, state.model_to_pixel);
            }
            current = self.parent_index(parent);
        }
        (Affine::IDENTITY, Affine::IDENTITY)
    }

    /// Recompute one frame's composites from its parent's current ones.
    pub(crate) fn refresh_transforms(&mut self, frame: ElementId) {
        let (p2m, m2p) = self.parent_transforms(frame.index);
        if let Ok(state) = self.frame_state_mut(frame) {
            state.recompute(p2m, m2p);
        }
    }

    /// Create a child frame of `parent` (a 2D frame) with the given affine.
    pub(crate) fn new_frame(
        &mut self,
        parent: ElementId,
        affine: Affine,
        request: bool,
    ) -> Result<ElementId> {
        let inv = invert(affine)?;
        let style = self.element(parent)?.style.clone();
        let element = self.new_element(
            "Frame",
            style,
            ElementKind::Frame(FrameState::with_affine(affine, inv)),
        );
        let id = self.attach(parent, element, request)?;
        self.refresh_transforms(id);
        Ok(id)
    }

    /// Child frame with `affine` (identity when `None`).
    pub fn sub_frame(&mut self, parent: ElementId, affine: Option<Affine>) -> Result<ElementId> {
        self.new_frame(parent, affine.unwrap_or(Affine::IDENTITY), true)
    }

    /// Child frame whose affine maps the box `[from_min, from_max]` of the
    /// parent's model space onto `[to_min, to_max]`.
    pub fn region_frame(
        &mut self,
        parent: ElementId,
        from_min: Point,
        from_max: Point,
        to_min: Point,
        to_max: Point,
    ) -> Result<ElementId> {
        let affine = checked_region_map(from_min, from_max, to_min, to_max, self.config.epsilon)?;
        self.new_frame(parent, affine, true)
    }

    /// Replace a frame's parent-relative transform. Composites catch up on
    /// the next redraw.
    pub fn set_affine(&mut self, frame: ElementId, affine: Affine) -> Result<()> {
        let inv = invert(affine)?;
        let state = self.frame_state_mut(frame)?;
        state.affine = affine;
        state.inv = inv;
        self.request_redraw();
        Ok(())
    }

    pub fn affine(&self, frame: ElementId) -> Result<Affine> {
        Ok(self.frame_state(frame)?.affine)
    }

    pub fn frame(&self, frame: ElementId) -> Result<&FrameState> {
        self.frame_state(frame)
    }

    /// Model point → cartesian pixel.
    pub fn to_pixel(&self, frame: ElementId, point: Point) -> Result<Point> {
        Ok(self.frame_state(frame)?.model_to_pixel * point)
    }

    /// Cartesian pixel → model point.
    pub fn to_model(&self, frame: ElementId, pixel: Point) -> Result<Point> {
        Ok(self.frame_state(frame)?.pixel_to_model * pixel)
    }

    /// Children of a 2D frame in paint order, including defunct ones not
    /// yet swept.
    pub fn draw_order(&self, frame: ElementId) -> Result<&[ElementId]> {
        Ok(&self.frame_state(frame)?.draw_order)
    }

    /// Find a child of a frame or 3D frame by name.
    pub fn lookup(&self, container: ElementId, name: &str) -> Option<ElementId> {
        let name = self.names.get(name)?;
        match &self.element(container).ok()?.kind {
            ElementKind::Frame(state) => state.names.get(&name).copied(),
            ElementKind::Frame3d(state) => state.names.get(&name).copied(),
            _ => None,
        }
    }

    /// Rename an element within its container. Fails if another element
    /// already holds `new_name`; never requests a redraw.
    pub fn rename(&mut self, id: ElementId, new_name: &str) -> Result<()> {
        let old = self.element(id)?.name;
        let container = self.container_of(id)?;
        let new = self.names.intern(new_name);
        let names = match &mut self.element_mut(container)?.kind {
            ElementKind::Frame(state) => &mut state.names,
            ElementKind::Frame3d(state) => &mut state.names,
            other => {
                return Err(DrawError::WrongKind {
                    expected: "frame",
                    found: other.tag(),
                });
            }
        };
        if names.get(&new).is_some_and(|existing| *existing != id) {
            return Err(DrawError::NameInUse(new_name.to_owned()));
        }
        if names.get(&old) == Some(&id) {
            names.remove(&old);
        }
        names.insert(new, id);
        self.element_mut(id)?.name = new;
        Ok(())
    }

    /// Drop every child of a frame (or every 3D marking of a 3D frame).
    pub fn clear(&mut self, container: ElementId) -> Result<()> {
        let is_3d = match &self.element(container)?.kind {
            ElementKind::Frame(_) => false,
            ElementKind::Frame3d(_) => true,
            other => {
                return Err(DrawError::WrongKind {
                    expected: "frame",
                    found: other.tag(),
                });
            }
        };
        if is_3d {
            self.clear_frame3d(container)
        } else {
            self.clear_frame(container, true)
        }
    }

    pub(crate) fn clear_frame(&mut self, frame: ElementId, request: bool) -> Result<()> {
        let state = self.frame_state_mut(frame)?;
        let children = std::mem::take(&mut state.draw_order);
        state.names.clear();
        state.drag = None;
        for child in children {
            if let Ok(element) = self.element_mut(child) {
                element.defunct = true;
                self.remove_subtree(child.index);
            }
        }
        if request {
            self.request_redraw();
        }
        Ok(())
    }

    /// Pixel position of a frame's model origin.
    pub fn pixel_origin(&self, frame: ElementId) -> Result<Point> {
        self.to_pixel(frame, Point::ZERO)
    }

    /// Translate a frame so its model origin lands on `pixel`.
    pub fn set_pixel_origin(&mut self, frame: ElementId, pixel: Point) -> Result<()> {
        let state = self.frame_state(frame)?;
        let (parent_p2m, _) = self.parent_transforms(frame.index);
        let current = state.inv * Point::ZERO;
        let wanted = parent_p2m * pixel;
        let affine = state.affine * translation(current - wanted);
        self.set_affine(frame, affine)
    }

    /// The reference point of any element: a marking's own point, or the
    /// pixel origin of a frame.
    pub fn frame_point(&self, id: ElementId) -> Result<Point> {
        match &self.element(id)?.kind {
            ElementKind::Frame(_) => self.pixel_origin(id),
            ElementKind::Frame3d(state) => self.pixel_origin(state.target),
            ElementKind::Marking(marking) => Ok(marking.drawable().frame_point()),
            ElementKind::Marking3d(marking) => {
                let p = marking.shape.frame_point();
                Ok(Point::new(p.x, p.y))
            }
            ElementKind::Assembly(state) => Ok(state.frame_point),
        }
    }

    /// Move any element's reference point and request a redraw. 3D
    /// markings keep their depth coordinate.
    pub fn set_frame_point(&mut self, id: ElementId, point: Point) -> Result<()> {
        let target = match &mut self.element_mut(id)?.kind {
            ElementKind::Frame(_) => Some(id),
            ElementKind::Frame3d(state) => Some(state.target),
            ElementKind::Marking(marking) => {
                marking.drawable_mut().set_frame_point(point);
                None
            }
            ElementKind::Marking3d(marking) => {
                let z = marking.shape.frame_point().z;
                marking.shape.set_frame_point(glam::DVec3::new(point.x, point.y, z));
                None
            }
            ElementKind::Assembly(_) => return self.set_assembly_point(id, point),
        };
        match target {
            Some(frame) => self.set_pixel_origin(frame, point),
            None => {
                self.request_redraw();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualFrames;
    use pretty_assertions::assert_eq;
    use wassily_render::RecordingCanvas;

    fn surface() -> Surface {
        Surface::new(
            Box::new(RecordingCanvas::new(200.0, 100.0)),
            Box::new(ManualFrames::new()),
        )
        .unwrap()
    }

    fn assert_close(a: Point, b: Point) {
        assert!((a - b).hypot() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn region_frame_maps_pixels_to_model() {
        let mut surface = surface();
        let root = surface.root();
        let panel = surface
            .region_frame(
                root,
                Point::ZERO,
                Point::new(200.0, 100.0),
                Point::new(-1.0, -1.0),
                Point::new(1.0, 1.0),
            )
            .unwrap();
        assert_close(surface.to_pixel(panel, Point::ZERO).unwrap(), Point::new(100.0, 50.0));
        assert_close(surface.to_model(panel, Point::new(200.0, 0.0)).unwrap(), Point::new(1.0, -1.0));
    }

    #[test]
    fn degenerate_region_is_rejected() {
        let mut surface = surface();
        let root = surface.root();
        let result = surface.region_frame(
            root,
            Point::ZERO,
            Point::new(0.0, 10.0),
            Point::ZERO,
            Point::new(1.0, 1.0),
        );
        assert_eq!(result, Err(DrawError::DegenerateRegion));
    }

    #[test]
    fn transforms_catch_up_on_redraw() {
        let mut surface = surface();
        let root = surface.root();
        let sub = surface.sub_frame(root, None).unwrap();
        surface.set_affine(root, Affine::scale(0.5)).unwrap();

        // stale until the next pass
        assert_close(surface.to_pixel(sub, Point::new(1.0, 1.0)).unwrap(), Point::new(1.0, 1.0));
        surface.animation_frame();
        assert_close(surface.to_pixel(sub, Point::new(1.0, 1.0)).unwrap(), Point::new(2.0, 2.0));
    }

    #[test]
    fn singular_affine_is_rejected() {
        let mut surface = surface();
        let root = surface.root();
        let flat = Affine::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(surface.set_affine(root, flat), Err(DrawError::SingularTransform));
        assert_eq!(surface.affine(root).unwrap(), Affine::IDENTITY);
    }

    #[test]
    fn rename_moves_the_name_entry() {
        let frames = ManualFrames::new();
        let mut surface = Surface::new(
            Box::new(RecordingCanvas::new(200.0, 100.0)),
            Box::new(frames.clone()),
        )
        .unwrap();
        let root = surface.root();
        let a = surface.circle(root, Point::ZERO, 1.0, true).unwrap();
        let b = surface.circle(root, Point::ZERO, 1.0, true).unwrap();
        surface.animation_frame();
        let requests = frames.requests();

        surface.rename(a, "sun").unwrap();
        assert_eq!(frames.requests(), requests);
        assert!(!surface.redraw_state().is_pending());
        assert_eq!(surface.lookup(root, "sun"), Some(a));
        assert_eq!(surface.name_of(a).unwrap(), "sun");

        assert_eq!(surface.rename(b, "sun"), Err(DrawError::NameInUse("sun".into())));
        assert_eq!(surface.lookup(root, "sun"), Some(a));
        // renaming to its own name is fine
        surface.rename(a, "sun").unwrap();
    }

    #[test]
    fn named_markings_reject_live_duplicates() {
        let mut surface = surface();
        let root = surface.root();
        let marking = crate::marking::Marking::Line(crate::marking::Line {
            start: Point::ZERO,
            end: Point::new(1.0, 0.0),
        });
        let first = surface.add_named_marking(root, "edge", marking.clone()).unwrap();
        assert_eq!(
            surface.add_named_marking(root, "edge", marking.clone()),
            Err(DrawError::DuplicateName("edge".into()))
        );
        surface.forget(first).unwrap();
        let second = surface.add_named_marking(root, "edge", marking).unwrap();
        assert_eq!(surface.lookup(root, "edge"), Some(second));
    }

    #[test]
    fn clear_empties_and_invalidates() {
        let mut surface = surface();
        let root = surface.root();
        let sub = surface.sub_frame(root, None).unwrap();
        let inner = surface.circle(sub, Point::ZERO, 1.0, true).unwrap();
        surface.clear(root).unwrap();

        assert!(surface.draw_order(root).unwrap().is_empty());
        assert!(!surface.is_live(sub));
        assert!(!surface.is_live(inner));
    }

    #[test]
    fn pixel_origin_moves_the_frame() {
        let mut surface = surface();
        let root = surface.root();
        let sub = surface.sub_frame(root, Some(Affine::scale(0.1))).unwrap();
        surface.set_pixel_origin(sub, Point::new(30.0, 40.0)).unwrap();
        surface.animation_frame();
        assert_close(surface.pixel_origin(sub).unwrap(), Point::new(30.0, 40.0));
        assert_close(surface.to_pixel(sub, Point::new(1.0, 0.0)).unwrap(), Point::new(40.0, 40.0));
    }
}
