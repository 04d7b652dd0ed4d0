pub mod assembly;
pub mod conveniences;
pub mod drag;
pub mod element;
pub mod events;
pub mod fit;
pub mod frame;
pub mod frame3d;
pub mod marking;
pub mod marking3d;
pub mod orbiter;
pub mod scheduler;
pub mod surface;

pub use assembly::{Arrow, Assembly, AssemblyState, Star};
pub use conveniences::panel_height;
pub use element::{Element, ElementId, ElementKind, EventContext, EventHandler, EventKind};
pub use fit::{FitState, compute_fit};
pub use frame::FrameState;
pub use frame3d::Frame3dState;
pub use marking::{
    Circle, Drawable, ImageMarking, Line, Marking, Painter, PathContext, Poly, RectMarking, TextBox,
};
pub use marking3d::{Marking3dState, Shape3d};
pub use orbiter::Orbiter;
pub use scheduler::{FrameRequester, ManualFrames, RedrawState};
pub use surface::Surface;
