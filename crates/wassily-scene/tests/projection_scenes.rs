//! Integration tests: 3D frames, depth sorting and camera orbiting.

use glam::DVec3;
use kurbo::Point;
use pretty_assertions::assert_eq;
use wassily_core::Projector;
use wassily_render::{DrawOp, RecordingCanvas};
use wassily_scene::{EventKind, ManualFrames, Marking, Surface};

fn cube(perspective: bool) -> (Surface, wassily_scene::ElementId, RecordingCanvas, ManualFrames) {
    let _ = env_logger::builder().is_test(true).try_init();
    let canvas = RecordingCanvas::new(100.0, 100.0);
    let frames = ManualFrames::new();
    let (surface, frame3d) = Surface::cube(
        Box::new(canvas.clone()),
        Box::new(frames.clone()),
        2.0,
        DVec3::ZERO,
        perspective,
        1.0,
    )
    .unwrap();
    (surface, frame3d, canvas, frames)
}

fn square_at(z: f64, x: f64) -> Vec<DVec3> {
    vec![
        DVec3::new(x, 0.0, z),
        DVec3::new(x + 0.1, 0.0, z),
        DVec3::new(x + 0.1, 0.1, z),
        DVec3::new(x, 0.1, z),
    ]
}

#[test]
fn polygons_paint_far_to_near() {
    let (mut surface, frame3d, _, _) = cube(true);
    // inserted middle, near, far
    surface.polygon3d(frame3d, &square_at(0.0, 0.2)).unwrap();
    surface.polygon3d(frame3d, &square_at(-1.0, 0.4)).unwrap();
    surface.polygon3d(frame3d, &square_at(1.0, 0.6)).unwrap();
    surface.animation_frame();

    let target = surface.target_frame(frame3d).unwrap();
    let first_x: Vec<f64> = surface
        .draw_order(target)
        .unwrap()
        .iter()
        .map(|id| match surface.marking(*id).unwrap() {
            Marking::Poly(poly) => poly.points[0].x,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    // far (x 0.6) at depth 4/3, middle (0.2) at 1, near (0.4) at 2/3
    let expected = [0.6 / (4.0 / 3.0), 0.2, 0.4 / (2.0 / 3.0)];
    assert_eq!(first_x.len(), 3);
    for (got, want) in first_x.iter().zip(expected) {
        assert!((got - want).abs() < 1e-9, "{first_x:?}");
    }
}

#[test]
fn projected_markings_are_painted() {
    let (mut surface, frame3d, canvas, _) = cube(false);
    surface.line3d(frame3d, DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0)).unwrap();
    surface.circle3d(frame3d, DVec3::new(-0.5, 0.0, 0.5), 0.1, true).unwrap();
    surface.animation_frame();

    let pass = canvas.last_pass();
    assert_eq!(pass.iter().filter(|op| matches!(op, DrawOp::Stroke(_))).count(), 1);
    assert_eq!(pass.iter().filter(|op| matches!(op, DrawOp::Fill(_))).count(), 1);
    assert_eq!(canvas.save_depth(), 0);
}

#[test]
fn depth_is_available_after_one_pass() {
    let (mut surface, frame3d, _, _) = cube(false);
    let dot = surface.circle3d(frame3d, DVec3::new(0.0, 0.0, 3.0), 0.1, true).unwrap();
    assert!(surface.depth(dot).is_err());
    surface.animation_frame();
    // eye at z = -3, focus length 3
    assert!((surface.depth(dot).unwrap() - 2.0).abs() < 1e-12);
}

#[test]
fn orthographic_and_perspective_projection() {
    let eye = DVec3::ZERO;
    let ahead = DVec3::new(0.0, 0.0, 1.0);
    let ortho = Projector::new(eye, ahead, false, Some(DVec3::Y)).unwrap();
    assert_eq!(ortho.project(DVec3::new(4.0, 6.0, 2.0)), DVec3::new(4.0, 6.0, 2.0));
    let persp = Projector::new(eye, ahead, true, Some(DVec3::Y)).unwrap();
    assert_eq!(persp.project(DVec3::new(4.0, 6.0, 2.0)), DVec3::new(2.0, 3.0, 2.0));
    assert!(Projector::new(eye, eye, true, None).is_err());
}

#[test]
fn dragging_orbits_the_camera() {
    let (mut surface, frame3d, _, frames) = cube(true);
    surface.poly3d(frame3d, &square_at(0.0, 0.0)).unwrap();
    surface.orbit(frame3d).unwrap();
    surface.orbit(frame3d).unwrap();
    surface.animation_frame();
    let before = surface.projector(frame3d).unwrap().clone();
    let requests = frames.requests();

    // a move with no drag in progress is declined
    assert!(!surface.dispatch(EventKind::PointerMove, Point::new(60.0, 50.0)).unwrap());

    assert!(surface.dispatch(EventKind::PointerDown, Point::new(50.0, 50.0)).unwrap());
    assert!(surface.orbiter(frame3d).unwrap().unwrap().is_dragging());
    assert!(surface.dispatch(EventKind::PointerMove, Point::new(75.0, 50.0)).unwrap());
    let during = surface.projector(frame3d).unwrap().clone();
    assert!((during.eye() - before.eye()).length() > 0.1);
    assert!((during.eye().length() - 3.0).abs() < 1e-9);
    assert_eq!(during.look_at_point(), DVec3::ZERO);
    assert_eq!(frames.requests(), requests + 1);

    assert!(surface.dispatch(EventKind::PointerOut, Point::new(75.0, 50.0)).unwrap());
    assert!(!surface.orbiter(frame3d).unwrap().unwrap().is_dragging());
    surface.animation_frame();

    // the drag rotated relative to where it started, not incrementally
    let after = surface.projector(frame3d).unwrap();
    assert!((after.eye() - during.eye()).length() < 1e-9);
}

#[test]
fn moving_a_3d_marking_keeps_its_depth() {
    let (mut surface, frame3d, _, _) = cube(false);
    let dot = surface.circle3d(frame3d, DVec3::new(0.0, 0.0, 1.5), 0.1, true).unwrap();
    surface.set_frame_point(dot, Point::new(0.25, -0.25)).unwrap();
    surface.animation_frame();
    assert_eq!(surface.frame_point(dot).unwrap(), Point::new(0.25, -0.25));
    assert!((surface.depth(dot).unwrap() - 1.5).abs() < 1e-12);
}
