//! Drag-to-rotate for 3D frames.
//!
//! Pointer down records the start point and the current projector; every
//! move rotates that original projector by the offset from the start, so
//! the camera never accumulates drift during one drag.

use crate::element::{ElementId, EventContext, EventKind};
use crate::surface::Surface;
use kurbo::Point;
use wassily_core::{Projector, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Orbiter {
    start: Option<Point>,
    end: Option<Point>,
    original: Option<Projector>,
}

impl Orbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.start.is_some()
    }

    /// Latest pointer position of the current drag.
    pub fn end(&self) -> Option<Point> {
        self.end
    }

    pub fn pointer_down(&mut self, at: Point, current: &Projector) {
        self.start = Some(at);
        self.end = None;
        self.original = Some(current.clone());
    }

    /// The rotated projector, or `None` when no drag is in progress.
    pub fn pointer_move(&mut self, at: Point) -> Option<Result<Projector>> {
        let start = self.start?;
        let original = self.original.as_ref()?;
        self.end = Some(at);
        Some(original.rotation(original.xy_offset_rotation(start, at)))
    }

    /// Finish the drag with one last rotation.
    pub fn pointer_up(&mut self, at: Point) -> Option<Result<Projector>> {
        let result = self.pointer_move(at);
        *self = Self::default();
        result
    }
}

impl Surface {
    /// Let pointer drags on a 3D frame rotate its camera about the look-at
    /// point. Calling it again is a no-op.
    pub fn orbit(&mut self, frame3d: ElementId) -> Result<()> {
        let state = self.frame3d_state_mut(frame3d)?;
        if state.orbiter.is_some() {
            return Ok(());
        }
        state.orbiter = Some(Orbiter::new());
        let target = state.target;
        for kind in [
            EventKind::PointerDown,
            EventKind::PointerMove,
            EventKind::PointerUp,
            EventKind::PointerOut,
        ] {
            self.on_event(
                target,
                kind,
                Box::new(move |surface, cx| surface.orbit_event(frame3d, cx)),
            )?;
        }
        log::debug!("orbiting {frame3d}");
        Ok(())
    }

    pub fn orbiter(&self, frame3d: ElementId) -> Result<Option<&Orbiter>> {
        Ok(self.frame3d_state(frame3d)?.orbiter.as_ref())
    }

    fn orbit_event(&mut self, frame3d: ElementId, cx: &EventContext) -> Result<bool> {
        let state = self.frame3d_state_mut(frame3d)?;
        let Some(orbiter) = state.orbiter.as_mut() else {
            return Ok(false);
        };
        let rotated = match cx.kind {
            EventKind::PointerDown => {
                orbiter.pointer_down(cx.frame_point, &state.projector);
                return Ok(true);
            }
            EventKind::PointerMove => {
                if !orbiter.is_dragging() {
                    return Ok(false);
                }
                orbiter.pointer_move(cx.frame_point)
            }
            EventKind::PointerUp | EventKind::PointerOut => orbiter.pointer_up(cx.frame_point),
            EventKind::Click => return Ok(false),
        };
        if let Some(projector) = rotated {
            state.projector = projector?;
            self.request_redraw();
        }
        Ok(true)
    }
}
