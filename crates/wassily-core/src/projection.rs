//! 3D → 2D projection.
//!
//! A [`Projector`] is an immutable camera: eye, look-at point, and an up
//! hint that is re-orthogonalized against the view direction every time a
//! projector is built. Rotating the camera returns a new projector, so a
//! render still holding the old one is unaffected.

use crate::error::{DrawError, Result};
use glam::{DMat3, DMat4, DVec3, DVec4};
use kurbo::Point;

/// Default tolerance for eye/look-at coincidence and parallel up hints.
pub const EPSILON: f64 = 1e-6;

/// The component of `from` perpendicular to `to`.
pub fn perpendicular_component(to: DVec3, from: DVec3) -> DVec3 {
    let n = to.normalize();
    from - n * n.dot(from)
}

/// Orthonormal camera basis derived from eye, look-at and up hint.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Basis {
    right: DVec3,
    up: DVec3,
    forward: DVec3,
    distance: f64,
}

fn camera_basis(eye: DVec3, look_at: DVec3, up_hint: DVec3, epsilon: f64) -> Result<Basis> {
    let direction = look_at - eye;
    let distance = direction.length();
    if !(distance >= epsilon) {
        return Err(DrawError::EyeAtLookAt);
    }
    let forward = direction / distance;
    let mut up = perpendicular_component(forward, up_hint);
    if up.length() < epsilon {
        up = perpendicular_component(forward, DVec3::new(1.0, 1.0, 0.0));
    }
    let up = up.normalize();
    let right = up.cross(forward).normalize();
    Ok(Basis {
        right,
        up,
        forward,
        distance,
    })
}

/// The 4×4 matrix taking world space into the camera basis centered at the
/// eye: `eye + right → x`, `eye + up → y`, `eye + forward → z`.
fn basis_matrix(eye: DVec3, basis: &Basis) -> Result<DMat4> {
    let a = DMat4::from_cols(
        (eye + basis.right).extend(1.0),
        (eye + basis.up).extend(1.0),
        (eye + basis.forward).extend(1.0),
        eye.extend(1.0),
    );
    let det = a.determinant();
    if !det.is_finite() || det.abs() < crate::affine::SINGULAR_EPSILON {
        return Err(DrawError::SingularTransform);
    }
    let b = DMat4::from_cols(
        DVec4::new(1.0, 0.0, 0.0, 1.0),
        DVec4::new(0.0, 1.0, 0.0, 1.0),
        DVec4::new(0.0, 0.0, 1.0, 1.0),
        DVec4::new(0.0, 0.0, 0.0, 1.0),
    );
    Ok(b * a.inverse())
}

/// Build the projection matrix for a camera, as used by [`Projector`].
pub fn projection_matrix(
    eye: DVec3,
    look_at: DVec3,
    up: Option<DVec3>,
    epsilon: f64,
) -> Result<DMat4> {
    let basis = camera_basis(eye, look_at, up.unwrap_or(DVec3::Y), epsilon)?;
    basis_matrix(eye, &basis)
}

/// Camera projecting world points to 2D with a depth key.
#[derive(Debug, Clone, PartialEq)]
pub struct Projector {
    eye: DVec3,
    look_at: DVec3,
    perspective: bool,
    epsilon: f64,
    basis: Basis,
    matrix: DMat4,
}

impl Projector {
    /// Create a projector. `up` defaults to `+y`.
    pub fn new(eye: DVec3, look_at: DVec3, perspective: bool, up: Option<DVec3>) -> Result<Self> {
        Self::with_epsilon(eye, look_at, perspective, up, EPSILON)
    }

    pub fn with_epsilon(
        eye: DVec3,
        look_at: DVec3,
        perspective: bool,
        up: Option<DVec3>,
        epsilon: f64,
    ) -> Result<Self> {
        let basis = camera_basis(eye, look_at, up.unwrap_or(DVec3::Y), epsilon)?;
        let matrix = basis_matrix(eye, &basis)?;
        Ok(Self {
            eye,
            look_at,
            perspective,
            epsilon,
            basis,
            matrix,
        })
    }

    /// Same camera aimed at a new point.
    pub fn look_at(&self, look_at: DVec3) -> Result<Self> {
        Self::with_epsilon(self.eye, look_at, self.perspective, Some(self.basis.up), self.epsilon)
    }

    /// Same camera moved to a new eye point.
    pub fn look_from(&self, eye: DVec3) -> Result<Self> {
        Self::with_epsilon(eye, self.look_at, self.perspective, Some(self.basis.up), self.epsilon)
    }

    pub fn eye(&self) -> DVec3 {
        self.eye
    }

    pub fn look_at_point(&self) -> DVec3 {
        self.look_at
    }

    /// The orthonormalized up vector.
    pub fn up(&self) -> DVec3 {
        self.basis.up
    }

    pub fn is_perspective(&self) -> bool {
        self.perspective
    }

    pub fn projection_matrix(&self) -> DMat4 {
        self.matrix
    }

    /// Distance from eye to look-at point.
    pub fn focus_length(&self) -> f64 {
        self.basis.distance
    }

    /// Normalizer for projected depth; equal to the focus length.
    pub fn zscale(&self) -> f64 {
        self.basis.distance
    }

    /// Project a world point.
    ///
    /// The first two components are the 2D image; the third is a depth key
    /// (1.0 at the look-at distance) used only for back-to-front sorting.
    pub fn project(&self, point: DVec3) -> DVec3 {
        let h = self.matrix * point.extend(1.0);
        let p = h.truncate() / h.w;
        let z = p.z / self.zscale();
        if self.perspective {
            DVec3::new(p.x / z, p.y / z, z)
        } else {
            DVec3::new(p.x, p.y, z)
        }
    }

    /// On-screen size multiplier for an object at `point`: objects nearer
    /// than the focus length grow, farther ones shrink. Always 1 for
    /// orthographic projection.
    pub fn distance_scale(&self, point: DVec3) -> f64 {
        if !self.perspective {
            return 1.0;
        }
        let depth = (point - self.eye).dot(self.basis.forward);
        self.focus_length() / depth
    }

    /// World-to-view rotation (rows are right, up, forward).
    pub fn orientation(&self) -> DMat3 {
        DMat3::from_cols(self.basis.right, self.basis.up, self.basis.forward).transpose()
    }

    /// A new projector orbiting the look-at point by `rotation`, expressed
    /// in view coordinates. The receiver is not modified.
    pub fn rotation(&self, rotation: DMat3) -> Result<Self> {
        let orientation = self.orientation();
        let world = orientation.transpose() * rotation * orientation;
        let up = world * self.basis.up;
        let offset = world * (self.eye - self.look_at);
        Self::with_epsilon(
            self.look_at + offset,
            self.look_at,
            self.perspective,
            Some(up),
            self.epsilon,
        )
    }

    /// Rotation for a pointer drag from `start` to `end` (frame units).
    ///
    /// The deltas are used directly as angles: yaw = -dx / focus,
    /// pitch = -dy / focus.
    pub fn xy_offset_rotation(&self, start: Point, end: Point) -> DMat3 {
        let delta = end - start;
        let yaw = -delta.x / self.focus_length();
        let pitch = -delta.y / self.focus_length();
        DMat3::from_rotation_x(pitch) * DMat3::from_rotation_y(yaw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_close(a: DVec3, b: DVec3) {
        assert!((a - b).length() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn perpendicular_component_drops_parallel_part() {
        let result = perpendicular_component(DVec3::X, DVec3::new(1.0, 1.0, 0.0));
        assert_close(result, DVec3::Y);
    }

    #[test]
    fn straight_ahead_matrix_is_identity() {
        let m = projection_matrix(DVec3::ZERO, DVec3::Z, Some(DVec3::Y), EPSILON).unwrap();
        assert!(m.abs_diff_eq(DMat4::IDENTITY, 1e-12), "{m:?}");
        let default_up = projection_matrix(DVec3::ZERO, DVec3::Z, None, EPSILON).unwrap();
        assert!(default_up.abs_diff_eq(DMat4::IDENTITY, 1e-12));
    }

    #[test]
    fn looking_along_y_falls_back_to_perpendicular_up() {
        let m = projection_matrix(DVec3::ZERO, DVec3::Y, None, EPSILON).unwrap();
        let p = m * DVec4::new(1.0, 2.0, 3.0, 1.0);
        assert_close(p.truncate(), DVec3::new(3.0, 1.0, 2.0));
    }

    #[test]
    fn matrix_translates_to_eye() {
        let eye = DVec3::new(1.0, -1.0, 1.0);
        let m = projection_matrix(eye, DVec3::new(1.0, -1.0, 2.0), None, EPSILON).unwrap();
        let p = m * DVec4::new(0.0, 0.0, 0.0, 1.0);
        assert_close(p.truncate(), DVec3::new(-1.0, 1.0, -1.0));
    }

    #[test]
    fn orthographic_projection_keeps_coordinates() {
        let projector = Projector::new(DVec3::ZERO, DVec3::Z, false, Some(DVec3::Y)).unwrap();
        assert_close(projector.project(DVec3::new(4.0, 6.0, 2.0)), DVec3::new(4.0, 6.0, 2.0));
    }

    #[test]
    fn perspective_projection_divides_by_depth() {
        let projector = Projector::new(DVec3::ZERO, DVec3::Z, true, Some(DVec3::Y)).unwrap();
        assert_close(projector.project(DVec3::new(2.0, 3.0, 1.0)), DVec3::new(2.0, 3.0, 1.0));
        assert_close(projector.project(DVec3::new(4.0, 6.0, 2.0)), DVec3::new(2.0, 3.0, 2.0));
    }

    #[test]
    fn depth_is_normalized_by_focus_length() {
        let projector =
            Projector::new(DVec3::new(0.0, 0.0, -4.0), DVec3::ZERO, false, None).unwrap();
        assert_eq!(projector.zscale(), 4.0);
        assert_close(projector.project(DVec3::new(1.0, 1.0, 4.0)), DVec3::new(1.0, 1.0, 2.0));
    }

    #[test]
    fn coincident_eye_and_look_at_is_rejected() {
        let err = Projector::new(DVec3::ZERO, DVec3::ZERO, true, None);
        assert_eq!(err, Err(DrawError::EyeAtLookAt));
    }

    #[test]
    fn distance_scale_grows_when_near() {
        let projector =
            Projector::new(DVec3::new(0.0, 0.0, -2.0), DVec3::ZERO, true, None).unwrap();
        assert!((projector.distance_scale(DVec3::ZERO) - 1.0).abs() < 1e-12);
        assert!((projector.distance_scale(DVec3::new(0.0, 0.0, -1.0)) - 2.0).abs() < 1e-12);
        assert!((projector.distance_scale(DVec3::new(5.0, 0.0, 2.0)) - 0.5).abs() < 1e-12);

        let flat = Projector::new(DVec3::new(0.0, 0.0, -2.0), DVec3::ZERO, false, None).unwrap();
        assert_eq!(flat.distance_scale(DVec3::new(0.0, 0.0, 7.0)), 1.0);
    }

    #[test]
    fn rotation_orbits_without_mutating_receiver() {
        let projector =
            Projector::new(DVec3::new(0.0, 0.0, -1.0), DVec3::ZERO, true, None).unwrap();
        let quarter = DMat3::from_rotation_y(std::f64::consts::FRAC_PI_2);
        let rotated = projector.rotation(quarter).unwrap();

        assert_close(projector.eye(), DVec3::new(0.0, 0.0, -1.0));
        assert_close(rotated.eye(), DVec3::new(-1.0, 0.0, 0.0));
        assert_close(rotated.up(), DVec3::Y);
        assert_close(rotated.look_at_point(), DVec3::ZERO);
        assert!((rotated.focus_length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn identity_rotation_is_a_fixed_point() {
        let projector = Projector::new(
            DVec3::new(3.0, 2.0, 1.0),
            DVec3::new(0.5, 0.0, 0.0),
            true,
            Some(DVec3::Z),
        )
        .unwrap();
        let same = projector.rotation(DMat3::IDENTITY).unwrap();
        assert_close(same.eye(), projector.eye());
        assert_close(same.up(), projector.up());
    }

    #[test]
    fn drag_offset_maps_to_yaw_and_pitch() {
        let projector =
            Projector::new(DVec3::new(0.0, 0.0, -2.0), DVec3::ZERO, true, None).unwrap();
        let none = projector.xy_offset_rotation(Point::new(3.0, 3.0), Point::new(3.0, 3.0));
        assert!(none.abs_diff_eq(DMat3::IDENTITY, 1e-12));

        let yaw = projector.xy_offset_rotation(Point::new(0.0, 0.0), Point::new(2.0, 0.0));
        assert!(yaw.abs_diff_eq(DMat3::from_rotation_y(-1.0), 1e-12));

        let pitch = projector.xy_offset_rotation(Point::new(0.0, 0.0), Point::new(0.0, 1.0));
        assert!(pitch.abs_diff_eq(DMat3::from_rotation_x(-0.5), 1e-12));
    }
}
