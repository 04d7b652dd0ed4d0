//! Dragging 2D markings and assemblies within their frame.

use crate::element::{ElementId, ElementKind, EventContext, EventKind};
use crate::surface::Surface;
use kurbo::{Point, Vec2};
use wassily_core::{DrawError, Result};

/// An in-progress drag, held by the frame that owns the marking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub(crate) element: ElementId,
    /// Marking anchor minus pointer position at grab time.
    pub(crate) grab: Vec2,
}

impl Surface {
    /// Let the pointer move a marking around its frame. The drag ends on
    /// pointer up or when the pointer leaves the canvas.
    pub fn draggable(&mut self, marking: ElementId) -> Result<()> {
        match &self.element(marking)?.kind {
            ElementKind::Marking(_) | ElementKind::Assembly(_) => {}
            other => {
                return Err(DrawError::WrongKind {
                    expected: "marking",
                    found: other.tag(),
                });
            }
        }
        let frame = self.container_of(marking)?;
        self.frame_state(frame)?;
        self.on_event(
            marking,
            EventKind::PointerDown,
            Box::new(move |surface, cx| surface.start_drag(frame, marking, cx.frame_point)),
        )
    }

    /// The marking currently being dragged in `frame`.
    pub fn dragging(&self, frame: ElementId) -> Result<Option<ElementId>> {
        Ok(self.frame_state(frame)?.drag.map(|d| d.element))
    }

    fn start_drag(&mut self, frame: ElementId, marking: ElementId, pointer: Point) -> Result<bool> {
        let anchor = self.frame_point(marking)?;
        self.frame_state_mut(frame)?.drag = Some(DragState {
            element: marking,
            grab: anchor - pointer,
        });
        log::trace!("drag start {marking}");
        Ok(true)
    }

    /// Route move/up/out to an active drag. `None` when the frame has no
    /// drag in progress or the event cannot affect one.
    pub(crate) fn drag_event(&mut self, frame: ElementId, cx: &EventContext) -> Result<Option<bool>> {
        if !matches!(
            cx.kind,
            EventKind::PointerMove | EventKind::PointerUp | EventKind::PointerOut
        ) {
            return Ok(None);
        }
        let Some(drag) = self.frame_state(frame)?.drag else {
            return Ok(None);
        };
        if self.is_live(drag.element) {
            self.set_frame_point(drag.element, cx.frame_point + drag.grab)?;
        }
        if cx.kind.ends_drag() {
            self.frame_state_mut(frame)?.drag = None;
            log::trace!("drag end {}", drag.element);
        }
        Ok(Some(true))
    }
}
