//! Pointer event dispatch.
//!
//! Events enter at the root frame with a canvas-pixel position. A frame
//! offers the event to an active drag first, then to its own handler, then
//! to its responsive children that contain the pointer, topmost first. The
//! first handler that returns `true` stops dispatch.

use crate::element::{ElementId, ElementKind, EventContext, EventHandler, EventKind};
use crate::surface::Surface;
use kurbo::Point;
use petgraph::stable_graph::NodeIndex;
use wassily_core::Result;
use wassily_render::to_cartesian;

impl Surface {
    /// Install a handler on an element, replacing any previous handler for
    /// the same event. The element and every container above it become
    /// responsive. Handlers on a 3D frame go to its drawing frame.
    pub fn on_event(&mut self, id: ElementId, kind: EventKind, handler: EventHandler) -> Result<()> {
        let target = match &self.element(id)?.kind {
            ElementKind::Frame3d(state) => state.target,
            _ => id,
        };
        let element = self.element_mut(target)?;
        element.running.remove(&kind);
        element.handlers.insert(kind, handler);
        self.make_responsive(target.index);
        Ok(())
    }

    /// Remove a handler. Responsiveness is left as is.
    pub fn remove_event(&mut self, id: ElementId, kind: EventKind) -> Result<bool> {
        let target = match &self.element(id)?.kind {
            ElementKind::Frame3d(state) => state.target,
            _ => id,
        };
        let element = self.element_mut(target)?;
        let running = element.running.remove(&kind);
        Ok(element.handlers.remove(&kind).is_some() || running)
    }

    fn make_responsive(&mut self, index: NodeIndex) {
        let mut current = Some(index);
        while let Some(index) = current {
            if let Some(element) = self.graph.node_weight_mut(index) {
                element.responsive = true;
            }
            current = self.parent_index(index);
        }
    }

    /// Offer a pointer event at `canvas_point` (canvas pixels, y down).
    /// Returns whether any handler claimed it.
    pub fn dispatch(&mut self, kind: EventKind, canvas_point: Point) -> Result<bool> {
        log::trace!("dispatch {} at {canvas_point:?}", kind.as_str());
        let root = self.root;
        self.dispatch_frame(root, kind, canvas_point)
    }

    fn dispatch_frame(&mut self, frame: ElementId, kind: EventKind, canvas: Point) -> Result<bool> {
        let cartesian = to_cartesian(canvas, self.height());
        let state = self.frame_state(frame)?;
        let cx = EventContext {
            kind,
            element: frame,
            canvas,
            cartesian,
            frame_point: state.pixel_to_model * cartesian,
        };

        if let Some(claimed) = self.drag_event(frame, &cx)? {
            return Ok(claimed);
        }
        if self.call_handler(frame, &cx)? {
            return Ok(true);
        }

        let order = self.frame_state(frame)?.draw_order.clone();
        let hits: Vec<ElementId> = order
            .into_iter()
            .filter(|child| self.accepts(*child, canvas))
            .collect();
        for child in hits.into_iter().rev() {
            let sub = match &self.element(child)?.kind {
                ElementKind::Frame(_) => Some(child),
                ElementKind::Frame3d(state) => Some(state.target),
                _ => None,
            };
            let claimed = match sub {
                Some(sub) => self.dispatch_frame(sub, kind, canvas)?,
                None => self.call_handler(child, &cx)?,
            };
            if claimed {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Live, responsive, and under the pointer. Frames cover the whole
    /// canvas.
    fn accepts(&self, id: ElementId, canvas: Point) -> bool {
        let Ok(element) = self.element(id) else {
            return false;
        };
        if element.defunct || !element.responsive {
            return false;
        }
        match element.kind {
            ElementKind::Frame(_) | ElementKind::Frame3d(_) => true,
            ElementKind::Marking(_) | ElementKind::Assembly(_) => self.pick(id, canvas),
            ElementKind::Marking3d(_) => false,
        }
    }

    /// Run `id`'s handler for the event, if any. The handler is taken out
    /// while it runs so it can mutate the surface freely, and goes back
    /// only if it was neither removed nor replaced meanwhile.
    fn call_handler(&mut self, id: ElementId, cx: &EventContext) -> Result<bool> {
        let Some(mut handler) = self.element_mut(id).ok().and_then(|element| {
            let handler = element.handlers.remove(&cx.kind)?;
            element.running.insert(cx.kind);
            Some(handler)
        }) else {
            return Ok(false);
        };
        let cx = EventContext { element: id, ..*cx };
        let result = handler(self, &cx);
        if let Ok(element) = self.element_mut(id)
            && element.running.remove(&cx.kind)
        {
            element.handlers.insert(cx.kind, handler);
        }
        result
    }
}
