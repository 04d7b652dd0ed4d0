pub mod affine;
pub mod config;
pub mod error;
pub mod id;
pub mod projection;
pub mod stats;
pub mod style;

pub use config::SurfaceConfig;
pub use error::{DrawError, Result};
pub use id::{Name, NameTable};
pub use projection::Projector;
pub use stats::CanvasStats;
pub use style::{Style, TextAlign, TextBaseline, rgb};

// Re-export geometry types so downstream crates agree on one version
pub use glam::{DMat3, DMat4, DVec3};
pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};
