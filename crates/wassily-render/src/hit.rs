//! Point-in-path testing with kurbo winding numbers.

use kurbo::{BezPath, PathEl, Point, Shape};

/// Close every open subpath, matching how canvas hit tests treat them.
pub fn closed_subpaths(path: &BezPath) -> BezPath {
    let mut out = BezPath::new();
    let mut open = false;
    for el in path.elements() {
        match el {
            PathEl::MoveTo(_) => {
                if open {
                    out.close_path();
                }
                open = true;
                out.push(*el);
            }
            PathEl::ClosePath => {
                open = false;
                out.push(*el);
            }
            _ => out.push(*el),
        }
    }
    if open {
        out.close_path();
    }
    out
}

/// True when `point` is inside `path` under the nonzero fill rule.
pub fn point_in_path(path: &BezPath, point: Point) -> bool {
    closed_subpaths(path).winding(point) != 0
}
