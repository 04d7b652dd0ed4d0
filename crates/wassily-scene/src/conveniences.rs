//! One-call setups for common diagrams: a 2D panel, a centered swatch and
//! a 3D cube view.

use crate::element::ElementId;
use crate::scheduler::FrameRequester;
use crate::surface::Surface;
use glam::DVec3;
use kurbo::{Point, Vec2};
use wassily_core::{DrawError, Projector, Result};
use wassily_render::Canvas;

/// Pixel height of a panel `width` pixels wide showing the model box
/// `[min, max]` without distortion.
pub fn panel_height(min: Point, max: Point, width: f64, epsilon: f64) -> Result<f64> {
    let extent = max - min;
    if !(extent.x.abs() >= epsilon && extent.y.abs() >= epsilon) {
        return Err(DrawError::DegenerateRegion);
    }
    if !(width > 0.0) {
        return Err(DrawError::InvalidDimensions {
            width,
            height: width * extent.y / extent.x,
        });
    }
    Ok(width * (extent.y / extent.x).abs())
}

impl Surface {
    /// A surface whose single frame maps the whole canvas onto the model
    /// box `[min, max]`.
    pub fn panel(
        canvas: Box<dyn Canvas>,
        requester: Box<dyn FrameRequester>,
        min: Point,
        max: Point,
    ) -> Result<(Surface, ElementId)> {
        let mut surface = Surface::new(canvas, requester)?;
        let root = surface.root();
        let corner = Point::new(surface.width(), surface.height());
        let frame = surface.region_frame(root, Point::ZERO, corner, min, max)?;
        Ok((surface, frame))
    }

    /// A panel `model_width` wide centered on `center`; the model height
    /// follows the canvas aspect ratio.
    pub fn swatch(
        canvas: Box<dyn Canvas>,
        requester: Box<dyn FrameRequester>,
        model_width: f64,
        center: Point,
    ) -> Result<(Surface, ElementId)> {
        let model_height = model_width * canvas.height() / canvas.width();
        let half = Vec2::new(model_width, model_height) / 2.0;
        Self::panel(canvas, requester, center - half, center + half)
    }

    /// A 3D frame looking at `center` along `+z` from `1.5 * model_width`
    /// away, drawn on a swatch `model_width * shrink` wide.
    pub fn cube(
        canvas: Box<dyn Canvas>,
        requester: Box<dyn FrameRequester>,
        model_width: f64,
        center: DVec3,
        perspective: bool,
        shrink: f64,
    ) -> Result<(Surface, ElementId)> {
        let (mut surface, swatch) = Self::swatch(
            canvas,
            requester,
            model_width * shrink,
            Point::new(center.x, center.y),
        )?;
        let eye = center + DVec3::new(0.0, 0.0, -1.5 * model_width);
        let epsilon = surface.config().epsilon;
        let projector = Projector::with_epsilon(eye, center, perspective, Some(DVec3::Y), epsilon)?;
        let frame3d = surface.frame3d(swatch, projector)?;
        Ok((surface, frame3d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualFrames;
    use pretty_assertions::assert_eq;
    use wassily_render::RecordingCanvas;

    #[test]
    fn panel_height_keeps_aspect() {
        let h = panel_height(Point::new(-1.0, -1.0), Point::new(3.0, 1.0), 400.0, 1e-6).unwrap();
        assert_eq!(h, 200.0);
        assert_eq!(
            panel_height(Point::ZERO, Point::new(1.0, 0.0), 400.0, 1e-6),
            Err(DrawError::DegenerateRegion)
        );
        assert!(matches!(
            panel_height(Point::ZERO, Point::new(1.0, 1.0), 0.0, 1e-6),
            Err(DrawError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn swatch_is_centered() {
        let (surface, frame) = Surface::swatch(
            Box::new(RecordingCanvas::new(200.0, 100.0)),
            Box::new(ManualFrames::new()),
            4.0,
            Point::new(1.0, 1.0),
        )
        .unwrap();
        let center = surface.to_pixel(frame, Point::new(1.0, 1.0)).unwrap();
        assert!((center - Point::new(100.0, 50.0)).hypot() < 1e-9);
        let corner = surface.to_model(frame, Point::ZERO).unwrap();
        assert!((corner - Point::new(-1.0, 0.0)).hypot() < 1e-9);
    }

    #[test]
    fn cube_looks_at_its_center() {
        let (surface, frame3d) = Surface::cube(
            Box::new(RecordingCanvas::new(100.0, 100.0)),
            Box::new(ManualFrames::new()),
            2.0,
            DVec3::ZERO,
            true,
            1.0,
        )
        .unwrap();
        let projector = surface.projector(frame3d).unwrap();
        assert_eq!(projector.eye(), DVec3::new(0.0, 0.0, -3.0));
        assert_eq!(projector.look_at_point(), DVec3::ZERO);
        assert!(projector.is_perspective());
    }
}
