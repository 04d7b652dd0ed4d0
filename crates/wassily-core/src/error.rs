//! Error taxonomy shared by every Wassily crate.
//!
//! Configuration errors (degenerate geometry, bad sizes) are raised at the
//! call that supplied the bad values. Illegal-state errors cover stale ids
//! and reads that would otherwise return a meaningless sentinel.

use std::fmt;

/// Errors raised by frame, marking, and projection operations.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawError {
    /// A region with zero (or sub-epsilon) width or height.
    DegenerateRegion,
    /// A surface or panel with non-positive pixel dimensions.
    InvalidDimensions { width: f64, height: f64 },
    /// Projector eye point within epsilon of the look-at point.
    EyeAtLookAt,
    /// An affine transform that cannot be inverted.
    SingularTransform,
    /// The element was forgotten, swept, or never attached to this surface.
    NotLive(String),
    /// The element exists but is the wrong kind for the operation.
    WrongKind {
        expected: &'static str,
        found: &'static str,
    },
    /// A different live element is already registered under this name.
    DuplicateName(String),
    /// Rename target is already taken.
    NameInUse(String),
    /// Depth was read from a 3D marking that has never been projected.
    DepthNotProjected(String),
    /// A scaled rectangle or image has no size to scale.
    MissingSize(String),
    /// Malformed configuration.
    InvalidConfig(String),
}

impl fmt::Display for DrawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawError::DegenerateRegion => write!(f, "region has zero extent"),
            DrawError::InvalidDimensions { width, height } => {
                write!(f, "dimensions must be positive, got {width} x {height}")
            }
            DrawError::EyeAtLookAt => {
                write!(f, "eye point and look-at point are too close together")
            }
            DrawError::SingularTransform => write!(f, "transform is not invertible"),
            DrawError::NotLive(what) => write!(f, "{what} is not attached to a live surface"),
            DrawError::WrongKind { expected, found } => {
                write!(f, "expected a {expected}, found a {found}")
            }
            DrawError::DuplicateName(name) => {
                write!(f, "name {name:?} already refers to another element")
            }
            DrawError::NameInUse(name) => write!(f, "name {name:?} is already in use"),
            DrawError::DepthNotProjected(name) => {
                write!(f, "depth of {name} read before it was projected")
            }
            DrawError::MissingSize(name) => write!(f, "{name} has no size"),
            DrawError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for DrawError {}

pub type Result<T> = std::result::Result<T, DrawError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = DrawError::NameInUse("Circle3".into());
        assert_eq!(err.to_string(), "name \"Circle3\" is already in use");

        let err = DrawError::WrongKind {
            expected: "frame",
            found: "marking",
        };
        assert_eq!(err.to_string(), "expected a frame, found a marking");
    }
}
