//! 2D homogeneous transform helpers.
//!
//! Matrices are `kurbo::Affine` values: the top two rows of a 3×3
//! homogeneous matrix, composed right-to-left (`a * b` applies `b` first).

use crate::error::{DrawError, Result};
use kurbo::{Affine, Point, Vec2};

/// Determinants smaller than this are treated as singular.
pub const SINGULAR_EPSILON: f64 = 1e-12;

/// Scale by `scale`, then translate by `translate`.
pub fn translate_scale(translate: Vec2, scale: Vec2) -> Affine {
    Affine::new([scale.x, 0.0, 0.0, scale.y, translate.x, translate.y])
}

/// Pure translation (unit scale).
pub fn translation(translate: Vec2) -> Affine {
    translate_scale(translate, Vec2::new(1.0, 1.0))
}

/// Map the box `[from_min, from_max]` onto `[to_min, to_max]`.
///
/// Built as translate-to-origin, then anisotropic scale, then translate to
/// the destination. A zero-extent source yields infinite scale; callers
/// that accept user input should use [`checked_region_map`].
pub fn region_map(from_min: Point, from_max: Point, to_min: Point, to_max: Point) -> Affine {
    let from_size = from_max - from_min;
    let to_size = to_max - to_min;
    let scale = Vec2::new(to_size.x / from_size.x, to_size.y / from_size.y);
    let to_origin = translation(-from_min.to_vec2());
    let scaling = translate_scale(Vec2::ZERO, scale);
    let to_destination = translation(to_min.to_vec2());
    to_destination * scaling * to_origin
}

/// [`region_map`] that rejects boxes with an extent below `epsilon` on
/// either axis, on either side of the mapping.
pub fn checked_region_map(
    from_min: Point,
    from_max: Point,
    to_min: Point,
    to_max: Point,
    epsilon: f64,
) -> Result<Affine> {
    let from_size = from_max - from_min;
    let to_size = to_max - to_min;
    let smallest = from_size
        .x
        .abs()
        .min(from_size.y.abs())
        .min(to_size.x.abs())
        .min(to_size.y.abs());
    if !(smallest >= epsilon) {
        return Err(DrawError::DegenerateRegion);
    }
    Ok(region_map(from_min, from_max, to_min, to_max))
}

/// Apply a transform to a point (the homogeneous coordinate stays 1).
pub fn apply_affine(matrix: Affine, point: Point) -> Point {
    matrix * point
}

/// Invert a transform, failing instead of producing NaN/infinite entries.
pub fn invert(matrix: Affine) -> Result<Affine> {
    let det = matrix.determinant();
    if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
        return Err(DrawError::SingularTransform);
    }
    Ok(matrix.inverse())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn region_map_inverts_y() {
        let affine = region_map(
            Point::new(10.0, 10.0),
            Point::new(20.0, 20.0),
            Point::new(100.0, 200.0),
            Point::new(110.0, 100.0),
        );
        let result = apply_affine(affine, Point::new(11.0, 11.0));
        assert!(close(result, Point::new(101.0, 190.0)), "got {result:?}");
    }

    #[test]
    fn region_map_hits_both_corners() {
        let boxes = [
            ((0.0, 0.0), (1.0, 1.0), (-5.0, 3.0), (7.0, 4.5)),
            ((-3.0, 2.0), (4.0, 9.0), (0.0, 600.0), (800.0, 0.0)),
            ((0.5, 0.25), (0.75, 100.0), (1e3, 1e-3), (2e3, 2e-3)),
        ];
        for (min, max, tmin, tmax) in boxes {
            let (min, max) = (Point::from(min), Point::from(max));
            let (tmin, tmax) = (Point::from(tmin), Point::from(tmax));
            let affine = region_map(min, max, tmin, tmax);
            assert!(close(affine * min, tmin));
            assert!(close(affine * max, tmax));
        }
    }

    #[test]
    fn translate_scale_scales_before_translating() {
        let m = translate_scale(Vec2::new(10.0, 20.0), Vec2::new(2.0, 3.0));
        assert!(close(m * Point::new(1.0, 1.0), Point::new(12.0, 23.0)));
    }

    #[test]
    fn checked_region_map_rejects_flat_boxes() {
        let err = checked_region_map(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            1e-6,
        );
        assert_eq!(err, Err(DrawError::DegenerateRegion));

        let flipped = checked_region_map(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 0.0),
            1e-6,
        );
        assert!(flipped.is_ok());
    }

    #[test]
    fn invert_rejects_singular() {
        let flat = translate_scale(Vec2::new(1.0, 1.0), Vec2::new(0.0, 2.0));
        assert_eq!(invert(flat), Err(DrawError::SingularTransform));

        let m = region_map(
            Point::new(1.0, 2.0),
            Point::new(3.0, 7.0),
            Point::new(-1.0, 0.0),
            Point::new(1.0, 1.0),
        );
        let inv = invert(m).unwrap();
        let p = Point::new(0.3, -4.0);
        assert!(close(inv * (m * p), p));
    }
}
