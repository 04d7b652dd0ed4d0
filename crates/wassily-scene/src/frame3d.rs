//! 3D frames: a projector plus the 3D markings it projects.
//!
//! A 3D frame owns a hidden 2D drawing frame. On every redraw the drawing
//! frame is cleared and refilled with the 2D projections of the 3D
//! markings, farthest first, so nearer shapes paint over farther ones.

use crate::element::{Element, ElementId, ElementKind};
use crate::frame::FrameState;
use crate::orbiter::Orbiter;
use crate::surface::Surface;
use std::collections::HashMap;
use wassily_core::{DrawError, Name, Projector, Result};

pub struct Frame3dState {
    pub(crate) projector: Projector,
    /// The 2D frame the projections are drawn into.
    pub(crate) target: ElementId,
    pub(crate) markings: Vec<ElementId>,
    pub(crate) names: HashMap<Name, ElementId>,
    pub(crate) orbiter: Option<Orbiter>,
}

impl Frame3dState {
    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn target(&self) -> ElementId {
        self.target
    }

    pub fn markings(&self) -> &[ElementId] {
        &self.markings
    }
}

impl Surface {
    pub(crate) fn frame3d_state(&self, id: ElementId) -> Result<&Frame3dState> {
        match &self.element(id)?.kind {
            ElementKind::Frame3d(state) => Ok(state),
            other => Err(DrawError::WrongKind {
                expected: "3D frame",
                found: other.tag(),
            }),
        }
    }

    pub(crate) fn frame3d_state_mut(&mut self, id: ElementId) -> Result<&mut Frame3dState> {
        match &mut self.element_mut(id)?.kind {
            ElementKind::Frame3d(state) => Ok(state),
            other => Err(DrawError::WrongKind {
                expected: "3D frame",
                found: other.tag(),
            }),
        }
    }

    /// Create a 3D frame inside a 2D frame. Projected coordinates are
    /// model coordinates of `parent`.
    pub fn frame3d(&mut self, parent: ElementId, projector: Projector) -> Result<ElementId> {
        let style = self.element(parent)?.style.clone();
        let state = Frame3dState {
            projector,
            // replaced once the drawing frame exists
            target: parent,
            markings: Vec::new(),
            names: HashMap::new(),
            orbiter: None,
        };
        let element = self.new_element("Frame3d", style.clone(), ElementKind::Frame3d(state));
        let id = self.attach(parent, element, true)?;

        let drawing = self.new_element("Frame", style, ElementKind::Frame(FrameState::default()));
        let target = self.insert_node(id, drawing);
        self.refresh_transforms(target);
        self.frame3d_state_mut(id)?.target = target;
        Ok(id)
    }

    pub fn projector(&self, frame3d: ElementId) -> Result<&Projector> {
        Ok(&self.frame3d_state(frame3d)?.projector)
    }

    /// Swap the camera and request a redraw.
    pub fn set_projector(&mut self, frame3d: ElementId, projector: Projector) -> Result<()> {
        self.frame3d_state_mut(frame3d)?.projector = projector;
        self.request_redraw();
        Ok(())
    }

    /// The hidden 2D frame that receives the projections.
    pub fn target_frame(&self, frame3d: ElementId) -> Result<ElementId> {
        Ok(self.frame3d_state(frame3d)?.target)
    }

    /// 3D markings in insertion order, including defunct ones not yet swept.
    pub fn markings3d(&self, frame3d: ElementId) -> Result<&[ElementId]> {
        Ok(&self.frame3d_state(frame3d)?.markings)
    }

    /// Register a new 3D marking with its frame.
    pub(crate) fn attach3d(&mut self, frame3d: ElementId, element: Element) -> Result<ElementId> {
        if !self.is_live(frame3d) {
            return Err(DrawError::NotLive(frame3d.to_string()));
        }
        let name = element.name;
        if let Some(existing) = self.frame3d_state(frame3d)?.names.get(&name).copied()
            && self.is_live(existing)
        {
            return Err(DrawError::DuplicateName(self.names.resolve(name).to_owned()));
        }
        let id = self.insert_node(frame3d, element);
        let state = self.frame3d_state_mut(frame3d)?;
        state.markings.push(id);
        state.names.insert(name, id);
        self.request_redraw();
        Ok(id)
    }

    /// Rebuild the drawing frame: project every live 3D marking and add
    /// the results back to front. Runs inside a redraw, so nothing here
    /// requests another one.
    pub(crate) fn prepare_frame3d(&mut self, frame3d: ElementId) {
        let Ok(state) = self.frame3d_state(frame3d) else {
            return;
        };
        let target = state.target;
        let projector = state.projector.clone();
        let markings = state.markings.clone();

        if let Err(err) = self.clear_frame(target, false) {
            log::warn!("cannot clear drawing frame of {frame3d}: {err}");
            return;
        }
        if let Ok(style) = self.style(frame3d).cloned()
            && let Ok(drawing) = self.element_mut(target)
        {
            drawing.style = style;
        }
        self.refresh_transforms(target);

        let mut dead = Vec::new();
        let mut projected = Vec::with_capacity(markings.len());
        for id in markings {
            match self.element_mut(id) {
                Ok(element) if !element.defunct => {
                    if let ElementKind::Marking3d(marking) = &mut element.kind {
                        let (depth, flat) = marking.shape.project(&projector);
                        marking.depth = Some(depth);
                        projected.push((depth, element.name, element.style.clone(), flat));
                    }
                }
                _ => dead.push(id),
            }
        }
        self.sweep3d(frame3d, &dead);

        projected.sort_by(|a, b| b.0.total_cmp(&a.0));
        for (_, name, style, flat) in projected {
            let element = self.named_element(name, style, ElementKind::Marking(flat));
            if let Err(err) = self.attach(target, element, false) {
                log::warn!("dropping projection in {frame3d}: {err}");
            }
        }
    }

    fn sweep3d(&mut self, frame3d: ElementId, dead: &[ElementId]) {
        if dead.is_empty() {
            return;
        }
        if let Ok(state) = self.frame3d_state_mut(frame3d) {
            state.markings.retain(|id| !dead.contains(id));
            state.names.retain(|_, id| !dead.contains(id));
        }
        for id in dead {
            if self.element(*id).is_ok() {
                log::trace!("sweeping {id}");
                self.remove_subtree(id.index);
            }
        }
    }

    pub(crate) fn clear_frame3d(&mut self, frame3d: ElementId) -> Result<()> {
        let state = self.frame3d_state_mut(frame3d)?;
        let markings = std::mem::take(&mut state.markings);
        state.names.clear();
        let target = state.target;
        for id in markings {
            if self.element(id).is_ok() {
                self.remove_subtree(id.index);
            }
        }
        self.clear_frame(target, false)?;
        self.request_redraw();
        Ok(())
    }
}
