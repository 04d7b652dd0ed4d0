//! The drawing surface: element arena, redraw scheduling and the draw pass.
//!
//! Every frame, marking and 3D element lives in one `StableDiGraph` owned
//! by the surface, with edges from container to child. Handles are
//! [`ElementId`]s; nothing holds a reference to anything else.

use crate::element::{Element, ElementId, ElementKind};
use crate::fit::FitState;
use crate::frame::FrameState;
use crate::marking::{Marking, Painter};
use crate::scheduler::{FrameRequester, RedrawState};
use kurbo::{Affine, Point};
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use wassily_core::{CanvasStats, DrawError, Name, NameTable, Result, Style, SurfaceConfig};
use wassily_render::{Canvas, to_canvas, with_style};

pub struct Surface {
    pub(crate) graph: StableDiGraph<Element, ()>,
    pub(crate) root: ElementId,
    pub(crate) canvas: Box<dyn Canvas>,
    requester: Box<dyn FrameRequester>,
    redraw: RedrawState,
    pub(crate) fit: FitState,
    pub(crate) stats: CanvasStats,
    pub(crate) names: NameTable,
    next_serial: u64,
    pub(crate) config: SurfaceConfig,
}

impl Surface {
    /// A surface drawing on `canvas`, with default configuration.
    pub fn new(canvas: Box<dyn Canvas>, requester: Box<dyn FrameRequester>) -> Result<Self> {
        let config = SurfaceConfig::new(canvas.width(), canvas.height());
        Self::with_config(canvas, requester, config)
    }

    /// The canvas decides the pixel size; `config` supplies the rest.
    pub fn with_config(
        canvas: Box<dyn Canvas>,
        requester: Box<dyn FrameRequester>,
        config: SurfaceConfig,
    ) -> Result<Self> {
        let config = SurfaceConfig {
            width: canvas.width(),
            height: canvas.height(),
            ..config
        };
        config.validate()?;

        let mut names = NameTable::with_counter(config.name_counter_start);
        let name = names.fresh("Frame");
        let root = Element::new(
            0,
            name,
            config.default_style.clone(),
            ElementKind::Frame(FrameState::default()),
        );
        let mut graph = StableDiGraph::new();
        let index = graph.add_node(root);

        Ok(Self {
            graph,
            root: ElementId { index, serial: 0 },
            canvas,
            requester,
            redraw: RedrawState::default(),
            fit: FitState::default(),
            stats: CanvasStats::new(),
            names,
            next_serial: 1,
            config,
        })
    }

    /// The top-level frame. Its transform maps model space to cartesian
    /// pixels (identity until changed or fitted).
    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn width(&self) -> f64 {
        self.canvas.width()
    }

    pub fn height(&self) -> f64 {
        self.canvas.height()
    }

    pub fn canvas(&self) -> &dyn Canvas {
        &*self.canvas
    }

    /// Points touched by the last draw pass, in cartesian pixels.
    pub fn stats(&self) -> &CanvasStats {
        &self.stats
    }

    /// Cartesian pixel → canvas pixel.
    pub fn to_canvas(&self, cartesian: Point) -> Point {
        to_canvas(cartesian, self.height())
    }

    /// RGBA of the pixel at a cartesian position.
    pub fn pixel_at(&self, cartesian: Point) -> Option<[u8; 4]> {
        self.canvas.pixel_at(self.to_canvas(cartesian))
    }

    // ─── Arena ───────────────────────────────────────────────────────────

    pub(crate) fn element(&self, id: ElementId) -> Result<&Element> {
        self.graph
            .node_weight(id.index)
            .filter(|e| e.serial == id.serial)
            .ok_or_else(|| DrawError::NotLive(id.to_string()))
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> Result<&mut Element> {
        self.graph
            .node_weight_mut(id.index)
            .filter(|e| e.serial == id.serial)
            .ok_or_else(|| DrawError::NotLive(id.to_string()))
    }

    /// Id of the element currently stored at `index`.
    pub(crate) fn id_at(&self, index: NodeIndex) -> Option<ElementId> {
        self.graph.node_weight(index).map(|e| ElementId {
            index,
            serial: e.serial,
        })
    }

    pub(crate) fn parent_index(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(index, Direction::Incoming)
            .next()
    }

    /// The frame or 3D frame holding `id`.
    pub fn container_of(&self, id: ElementId) -> Result<ElementId> {
        self.element(id)?;
        self.parent_index(id.index)
            .and_then(|index| self.id_at(index))
            .ok_or_else(|| DrawError::NotLive(id.to_string()))
    }

    pub(crate) fn new_element(&mut self, tag: &str, style: Style, kind: ElementKind) -> Element {
        let name = self.names.fresh(tag);
        self.named_element(name, style, kind)
    }

    /// An element under an already interned name. Used for elements
    /// rebuilt on every pass, which must not grow the name table.
    pub(crate) fn named_element(&mut self, name: Name, style: Style, kind: ElementKind) -> Element {
        let serial = self.next_serial;
        self.next_serial += 1;
        Element::new(serial, name, style, kind)
    }

    /// Add `element` under `container` without registering it anywhere.
    pub(crate) fn insert_node(&mut self, container: ElementId, element: Element) -> ElementId {
        let serial = element.serial;
        let index = self.graph.add_node(element);
        self.graph.add_edge(container.index, index, ());
        ElementId { index, serial }
    }

    /// Register a new child of a 2D frame in its draw order and name map.
    /// `request` is false for bookkeeping that must not schedule a frame
    /// (projecting 3D markings during a redraw).
    pub(crate) fn attach(
        &mut self,
        frame: ElementId,
        element: Element,
        request: bool,
    ) -> Result<ElementId> {
        if !self.is_live(frame) {
            return Err(DrawError::NotLive(frame.to_string()));
        }
        let name = element.name;
        if let Some(existing) = self.frame_state(frame)?.names.get(&name).copied()
            && self.is_live(existing)
        {
            return Err(DrawError::DuplicateName(self.names.resolve(name).to_owned()));
        }
        let id = self.insert_node(frame, element);
        let state = self.frame_state_mut(frame)?;
        state.draw_order.push(id);
        state.names.insert(name, id);
        if request {
            self.request_redraw();
        }
        Ok(id)
    }

    /// Add a marking to a frame, inheriting the frame's style.
    pub fn add_marking(&mut self, frame: ElementId, marking: Marking) -> Result<ElementId> {
        self.add_marking_stroked(frame, marking, None)
    }

    /// Add a marking under an explicit name.
    pub fn add_named_marking(
        &mut self,
        frame: ElementId,
        name: &str,
        marking: Marking,
    ) -> Result<ElementId> {
        let style = self.element(frame)?.style.clone();
        let mut element = self.new_element(marking.drawable().tag(), style, ElementKind::Marking(marking));
        element.name = self.names.intern(name);
        self.attach(frame, element, true)
    }

    pub(crate) fn add_marking_stroked(
        &mut self,
        frame: ElementId,
        marking: Marking,
        stroke: Option<bool>,
    ) -> Result<ElementId> {
        let mut style = self.element(frame)?.style.clone();
        if let Some(stroke) = stroke {
            style.stroke = stroke;
        }
        let element = self.new_element(marking.drawable().tag(), style, ElementKind::Marking(marking));
        self.attach(frame, element, true)
    }

    /// Remove a node and everything below it.
    pub(crate) fn remove_subtree(&mut self, index: NodeIndex) {
        let mut stack = vec![index];
        while let Some(current) = stack.pop() {
            let children: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(current, Direction::Outgoing)
                .collect();
            stack.extend(children);
            self.graph.remove_node(current);
        }
    }

    // ─── Identity and lifecycle ──────────────────────────────────────────

    /// Attached and not forgotten.
    pub fn is_live(&self, id: ElementId) -> bool {
        self.element(id).is_ok_and(|e| !e.defunct)
    }

    pub fn name_of(&self, id: ElementId) -> Result<&str> {
        Ok(self.names.resolve(self.element(id)?.name))
    }

    /// Mark an element defunct. It stops being drawn and hit-tested at
    /// once and is removed from its container on the next draw pass.
    pub fn forget(&mut self, id: ElementId) -> Result<()> {
        self.element_mut(id)?.defunct = true;
        self.request_redraw();
        Ok(())
    }

    pub fn set_responsive(&mut self, id: ElementId, responsive: bool) -> Result<()> {
        self.element_mut(id)?.responsive = responsive;
        Ok(())
    }

    pub fn is_responsive(&self, id: ElementId) -> Result<bool> {
        Ok(self.element(id)?.responsive)
    }

    pub fn kind_of(&self, id: ElementId) -> Result<&'static str> {
        Ok(self.element(id)?.kind.tag())
    }

    // ─── Style ───────────────────────────────────────────────────────────

    pub fn style(&self, id: ElementId) -> Result<&Style> {
        Ok(&self.element(id)?.style)
    }

    /// Mutate an element's style and request a redraw.
    pub fn update_style(&mut self, id: ElementId, f: impl FnOnce(&mut Style)) -> Result<()> {
        f(&mut self.element_mut(id)?.style);
        self.request_redraw();
        Ok(())
    }

    /// Copy `other`'s style onto `id`.
    pub fn style_like(&mut self, id: ElementId, other: ElementId) -> Result<()> {
        let style = self.element(other)?.style.clone();
        self.update_style(id, |s| *s = style)
    }

    // ─── Scheduling ──────────────────────────────────────────────────────

    /// Ask for a redraw; requests coalesce into one frame callback.
    pub fn request_redraw(&mut self) {
        if self.redraw.request() {
            log::debug!("redraw armed");
            self.arm_frame();
        }
    }

    pub fn pause_redraw(&mut self) {
        self.redraw.pause();
    }

    pub fn resume_redraw(&mut self) {
        if self.redraw.resume() {
            log::debug!("redraw armed on resume");
            self.arm_frame();
        }
    }

    fn arm_frame(&mut self) {
        if !self.requester.request_frame() {
            log::warn!("frame request failed, redraw left pending");
            self.redraw.disarm();
        }
    }

    pub fn redraw_state(&self) -> RedrawState {
        self.redraw
    }

    /// The frame callback: clear, recompute transforms top-down, draw,
    /// then run any fit that was waiting for content.
    pub fn animation_frame(&mut self) {
        self.redraw.begin_frame();
        log::debug!("animation frame");
        self.canvas.clear();
        self.stats.reset();
        let root = self.root;
        self.prepare_frame(root);
        self.draw_frame(root);
        self.apply_pending_fit();
    }

    /// Fire the frame callback only if one is armed.
    pub fn run_pending_frame(&mut self) -> bool {
        if self.redraw.is_scheduled() {
            self.animation_frame();
            return true;
        }
        false
    }

    // ─── Draw pass ───────────────────────────────────────────────────────

    /// Recompute composite transforms for `frame` and everything below it.
    pub(crate) fn prepare_frame(&mut self, frame: ElementId) {
        self.refresh_transforms(frame);
        let order = match self.frame_state(frame) {
            Ok(state) => state.draw_order.clone(),
            Err(_) => return,
        };
        for child in order {
            let Ok(element) = self.element(child) else {
                continue;
            };
            if element.defunct {
                continue;
            }
            match element.kind {
                ElementKind::Frame(_) => self.prepare_frame(child),
                ElementKind::Frame3d(_) => self.prepare_frame3d(child),
                ElementKind::Assembly(_) => self.prepare_assembly(child),
                ElementKind::Marking(_) | ElementKind::Marking3d(_) => {}
            }
        }
    }

    /// Paint a frame's live children in draw order, then sweep the
    /// defunct ones out of its collections.
    pub(crate) fn draw_frame(&mut self, frame: ElementId) {
        let Ok(element) = self.element(frame) else {
            return;
        };
        let ElementKind::Frame(state) = &element.kind else {
            return;
        };
        let style = element.style.clone();
        let order = state.draw_order.clone();
        let model_to_pixel = state.model_to_pixel;

        self.canvas.save();
        self.canvas.apply_style(&style);
        let mut dead = Vec::new();
        for child in order {
            let Ok(element) = self.element(child) else {
                dead.push(child);
                continue;
            };
            if element.defunct {
                dead.push(child);
                continue;
            }
            let frame_to_draw = match &element.kind {
                ElementKind::Frame(_) => Some(child),
                ElementKind::Frame3d(state) => Some(state.target),
                ElementKind::Assembly(state) => Some(state.frame),
                ElementKind::Marking(_) => None,
                ElementKind::Marking3d(_) => {
                    log::warn!("3D marking {child} found in a 2D draw order");
                    continue;
                }
            };
            match frame_to_draw {
                Some(sub) => self.draw_frame(sub),
                None => self.draw_marking(child, model_to_pixel),
            }
        }
        self.canvas.restore();
        self.sweep(frame, &dead);
    }

    /// Draw one marking between its own save/restore. A marking that
    /// fails is logged and skipped.
    fn draw_marking(&mut self, id: ElementId, model_to_pixel: Affine) {
        let Surface {
            graph,
            canvas,
            stats,
            names,
            config,
            ..
        } = self;
        let Some(element) = graph.node_weight(id.index) else {
            return;
        };
        let ElementKind::Marking(marking) = &element.kind else {
            return;
        };
        let result = with_style(canvas.as_mut(), &element.style, |canvas| {
            let mut painter = Painter {
                canvas,
                stats,
                model_to_pixel,
                style: &element.style,
                text_padding: config.text_padding,
            };
            marking.drawable().draw(&mut painter)
        });
        match result {
            Ok(()) => log::trace!("drew {}", names.resolve(element.name)),
            Err(err) => log::warn!("skipping {}: {err}", names.resolve(element.name)),
        }
    }

    /// Drop dead children from a frame's collections and the arena.
    fn sweep(&mut self, frame: ElementId, dead: &[ElementId]) {
        if dead.is_empty() {
            return;
        }
        if let Ok(state) = self.frame_state_mut(frame) {
            state.draw_order.retain(|id| !dead.contains(id));
            state.names.retain(|_, id| !dead.contains(id));
        }
        for id in dead {
            if self.element(*id).is_ok() {
                log::trace!("sweeping {id}");
                self.remove_subtree(id.index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualFrames;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;
    use wassily_render::{DrawOp, RecordingCanvas};

    fn surface() -> (Surface, RecordingCanvas, ManualFrames) {
        let canvas = RecordingCanvas::new(100.0, 100.0);
        let frames = ManualFrames::new();
        let surface = Surface::new(Box::new(canvas.clone()), Box::new(frames.clone())).unwrap();
        (surface, canvas, frames)
    }

    #[test]
    fn rejects_empty_canvas() {
        let result = Surface::new(
            Box::new(RecordingCanvas::new(0.0, 10.0)),
            Box::new(ManualFrames::new()),
        );
        assert!(matches!(result, Err(DrawError::InvalidDimensions { .. })));
    }

    #[test]
    fn names_come_from_the_surface_counter() {
        let canvas = RecordingCanvas::new(10.0, 10.0);
        let config = SurfaceConfig {
            name_counter_start: 7,
            ..SurfaceConfig::default()
        };
        let mut surface =
            Surface::with_config(Box::new(canvas), Box::new(ManualFrames::new()), config).unwrap();
        let root = surface.root();
        let circle = surface.circle(root, Point::new(1.0, 1.0), 1.0, true).unwrap();
        assert_eq!(surface.name_of(root).unwrap(), "Frame7");
        assert_eq!(surface.name_of(circle).unwrap(), "Circle8");
    }

    #[test]
    fn markings_inherit_frame_style() {
        let (mut surface, _, _) = surface();
        let root = surface.root();
        surface.update_style(root, |s| {
            s.colored("red");
        }).unwrap();
        let circle = surface.circle(root, Point::ZERO, 1.0, true).unwrap();
        let line = surface.line(root, Point::ZERO, Point::new(1.0, 1.0)).unwrap();
        assert_eq!(surface.style(circle).unwrap().color, "red");
        assert!(!surface.style(circle).unwrap().stroke);
        assert!(surface.style(line).unwrap().stroke);

        surface.style_like(root, line).unwrap();
        assert!(surface.style(root).unwrap().stroke);
    }

    #[test]
    fn every_save_is_restored() {
        let (mut surface, canvas, _) = surface();
        let root = surface.root();
        let sub = surface.sub_frame(root, None).unwrap();
        surface.circle(sub, Point::new(50.0, 50.0), 5.0, true).unwrap();
        surface.square(root, Point::new(10.0, 10.0), 4.0).unwrap();
        surface.animation_frame();

        assert_eq!(canvas.save_depth(), 0);
        let saves = canvas.ops().iter().filter(|op| **op == DrawOp::Save).count();
        assert_eq!(saves, 4);
    }

    #[test]
    fn failing_marking_does_not_blank_the_pass() {
        let (mut surface, canvas, _) = surface();
        let root = surface.root();
        let bad = surface.square(root, Point::ZERO, 4.0).unwrap();
        surface
            .update_marking(bad, |m| {
                if let Marking::Rect(rect) = m {
                    rect.size = None;
                }
            })
            .unwrap();
        surface.circle(root, Point::new(50.0, 50.0), 5.0, true).unwrap();
        surface.animation_frame();

        assert_eq!(canvas.painted_paths().len(), 1);
        assert_eq!(canvas.save_depth(), 0);
    }

    #[test]
    fn stale_ids_do_not_alias() {
        let (mut surface, _, _) = surface();
        let root = surface.root();
        let first = surface.circle(root, Point::ZERO, 1.0, true).unwrap();
        surface.forget(first).unwrap();
        surface.animation_frame();
        let second = surface.circle(root, Point::ZERO, 1.0, true).unwrap();

        assert_eq!(first.index, second.index);
        assert!(!surface.is_live(first));
        assert!(surface.is_live(second));
        assert!(matches!(surface.name_of(first), Err(DrawError::NotLive(_))));
    }

    #[test]
    fn forgotten_frames_take_no_children() {
        let (mut surface, _, _) = surface();
        let root = surface.root();
        let sub = surface.sub_frame(root, None).unwrap();
        surface.forget(sub).unwrap();

        assert!(matches!(
            surface.circle(sub, Point::ZERO, 1.0, true),
            Err(DrawError::NotLive(_))
        ));
        assert!(matches!(surface.sub_frame(sub, None), Err(DrawError::NotLive(_))));
        assert!(surface.draw_order(sub).unwrap().is_empty());
    }

    #[test]
    fn failed_frame_request_stays_pending() {
        struct Refusing(Rc<Cell<usize>>);
        impl FrameRequester for Refusing {
            fn request_frame(&mut self) -> bool {
                self.0.set(self.0.get() + 1);
                false
            }
        }

        let calls = Rc::new(Cell::new(0));
        let mut surface = Surface::new(
            Box::new(RecordingCanvas::new(10.0, 10.0)),
            Box::new(Refusing(calls.clone())),
        )
        .unwrap();
        surface.request_redraw();
        assert!(surface.redraw_state().is_pending());
        assert!(!surface.redraw_state().is_scheduled());

        surface.request_redraw();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn pixel_reads_flip_to_canvas_space() {
        let (surface, canvas, _) = surface();
        canvas.set_pixel(5, 90, [1, 2, 3, 4]);
        assert_eq!(surface.pixel_at(Point::new(5.0, 10.0)), Some([1, 2, 3, 4]));
    }
}
