//! Arena entries: identity, style, lifecycle flags and event handlers
//! shared by every frame and marking.

use crate::assembly::AssemblyState;
use crate::frame::FrameState;
use crate::frame3d::Frame3dState;
use crate::marking::Marking;
use crate::marking3d::Marking3dState;
use crate::surface::Surface;
use kurbo::Point;
use petgraph::stable_graph::NodeIndex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use wassily_core::{Name, Result, Style};

/// Handle to an element in a [`Surface`].
///
/// Carries a serial number so a handle to a swept element never resolves
/// to whatever later reuses its arena slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId {
    pub(crate) index: NodeIndex,
    pub(crate) serial: u64,
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index.index(), self.serial)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element #{}", self.index.index())
    }
}

/// Pointer events the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerOut,
    Click,
}

impl EventKind {
    /// Parse a DOM event type name (`"pointerdown"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pointerdown" => Some(Self::PointerDown),
            "pointermove" => Some(Self::PointerMove),
            "pointerup" => Some(Self::PointerUp),
            "pointerout" => Some(Self::PointerOut),
            "click" => Some(Self::Click),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PointerDown => "pointerdown",
            Self::PointerMove => "pointermove",
            Self::PointerUp => "pointerup",
            Self::PointerOut => "pointerout",
            Self::Click => "click",
        }
    }

    /// Up and out both end a drag.
    pub fn ends_drag(self) -> bool {
        matches!(self, Self::PointerUp | Self::PointerOut)
    }
}

/// What a handler learns about the event it is offered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventContext {
    pub kind: EventKind,
    /// The element whose handler is running.
    pub element: ElementId,
    /// Pointer position in canvas pixels (y down).
    pub canvas: Point,
    /// Pointer position in cartesian pixels (y up).
    pub cartesian: Point,
    /// Pointer position in the model space of the dispatching frame.
    pub frame_point: Point,
}

/// Returns `Ok(true)` to claim the event and stop dispatch.
pub type EventHandler = Box<dyn FnMut(&mut Surface, &EventContext) -> Result<bool>>;

pub enum ElementKind {
    Frame(FrameState),
    Frame3d(Frame3dState),
    Marking(Marking),
    Marking3d(Marking3dState),
    Assembly(AssemblyState),
}

impl ElementKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Frame(_) => "frame",
            ElementKind::Frame3d(_) => "frame3d",
            ElementKind::Marking(_) => "marking",
            ElementKind::Marking3d(_) => "marking3d",
            ElementKind::Assembly(_) => "assembly",
        }
    }
}

pub struct Element {
    pub(crate) serial: u64,
    pub(crate) name: Name,
    pub(crate) style: Style,
    pub(crate) responsive: bool,
    pub(crate) defunct: bool,
    pub(crate) handlers: HashMap<EventKind, EventHandler>,
    /// Handlers taken out of `handlers` while they run and still
    /// installed. Removing or replacing one clears its entry.
    pub(crate) running: HashSet<EventKind>,
    pub(crate) kind: ElementKind,
}

impl Element {
    pub(crate) fn new(serial: u64, name: Name, style: Style, kind: ElementKind) -> Self {
        Self {
            serial,
            name,
            style,
            responsive: false,
            defunct: false,
            handlers: HashMap::new(),
            running: HashSet::new(),
            kind,
        }
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn is_responsive(&self) -> bool {
        self.responsive
    }

    pub fn is_defunct(&self) -> bool {
        self.defunct
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_round_trip() {
        for kind in [
            EventKind::PointerDown,
            EventKind::PointerMove,
            EventKind::PointerUp,
            EventKind::PointerOut,
            EventKind::Click,
        ] {
            assert_eq!(EventKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::from_name("keydown"), None);
        assert!(EventKind::PointerOut.ends_drag());
        assert!(!EventKind::PointerMove.ends_drag());
    }
}
