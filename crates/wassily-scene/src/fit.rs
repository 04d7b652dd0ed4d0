//! Fit-to-content.
//!
//! After a draw pass the stats hold the cartesian box of everything
//! painted. Fitting maps that box (plus a border) onto the canvas,
//! preserving aspect ratio, by folding the mapping into the root frame's
//! transform. A fit requested before anything has been drawn waits for
//! the end of the next pass.

use crate::element::{ElementId, ElementKind};
use crate::surface::Surface;
use kurbo::{Affine, Point, Rect};
use wassily_core::affine::{invert, region_map};
use wassily_core::{DrawError, Result};

/// Whether a fit is waiting for the next draw pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum FitState {
    #[default]
    Idle,
    Pending { border: f64 },
}

/// Mapping from `bounds` onto a `width` × `height` canvas, centering the
/// shorter axis. `None` when the box is flat on either axis.
pub fn compute_fit(bounds: Rect, width: f64, height: f64) -> Option<Affine> {
    let (w, h) = (bounds.width(), bounds.height());
    if !(w > 0.0 && h > 0.0) {
        return None;
    }
    let mut to_min = Point::ZERO;
    let mut to_max = Point::new(width, height);
    if h / w > height / width {
        let fitted = height * w / h;
        to_min.x = (width - fitted) / 2.0;
        to_max.x = to_min.x + fitted;
    } else {
        let fitted = width * h / w;
        to_min.y = (height - fitted) / 2.0;
        to_max.y = to_min.y + fitted;
    }
    Some(region_map(
        Point::new(bounds.x0, bounds.y0),
        Point::new(bounds.x1, bounds.y1),
        to_min,
        to_max,
    ))
}

impl Surface {
    /// Fit drawn content to the canvas with `border` pixels to spare.
    ///
    /// `container` may be any frame; the fit always adjusts the root. A 3D
    /// frame with no markings is left alone. With nothing drawn yet the
    /// fit is deferred to the end of the next pass.
    pub fn fit(&mut self, container: ElementId, border: f64) -> Result<()> {
        match &self.element(container)?.kind {
            ElementKind::Frame3d(state) if state.markings.is_empty() => return Ok(()),
            ElementKind::Frame(_) | ElementKind::Frame3d(_) => {}
            other => {
                return Err(DrawError::WrongKind {
                    expected: "frame",
                    found: other.tag(),
                });
            }
        }
        if self.stats.is_empty() {
            log::debug!("fit deferred until content is drawn");
            self.fit = FitState::Pending { border };
        } else {
            self.fit_to_stats(border)?;
        }
        self.request_redraw();
        Ok(())
    }

    /// Fold the fit mapping into the root affine. Returns false when the
    /// content box is flat.
    fn fit_to_stats(&mut self, border: f64) -> Result<bool> {
        let Some(bounds) = self.stats.bounds() else {
            return Ok(false);
        };
        let bounds = bounds.inflate(border, border);
        let Some(mapping) = compute_fit(bounds, self.width(), self.height()) else {
            log::debug!("fit skipped: content has zero extent");
            return Ok(false);
        };
        let root = self.root;
        let state = self.frame_state_mut(root)?;
        let affine = invert(mapping * state.inv)?;
        state.inv = invert(affine)?;
        state.affine = affine;
        Ok(true)
    }

    /// Run a deferred fit at the end of a pass, then redraw once more.
    pub(crate) fn apply_pending_fit(&mut self) {
        let FitState::Pending { border } = std::mem::take(&mut self.fit) else {
            return;
        };
        if self.stats.is_empty() {
            log::warn!("deferred fit dropped: nothing was drawn");
            return;
        }
        match self.fit_to_stats(border) {
            Ok(true) => {
                log::debug!("deferred fit applied");
                self.request_redraw();
            }
            Ok(false) => {}
            Err(err) => log::warn!("deferred fit failed: {err}"),
        }
    }

    pub fn fit_state(&self) -> FitState {
        self.fit
    }
}
