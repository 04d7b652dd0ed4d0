//! Redraw coalescing.
//!
//! Any number of redraw requests between two animation frames arm a single
//! frame callback. The host owns the actual "next frame" mechanism through
//! [`FrameRequester`]; the surface calls [`Surface::animation_frame`] when
//! it fires.
//!
//! [`Surface::animation_frame`]: crate::Surface::animation_frame

use std::cell::Cell;
use std::rc::Rc;

/// Schedules a one-shot callback for the next animation frame.
pub trait FrameRequester {
    /// Returns false when no callback could be scheduled.
    fn request_frame(&mut self) -> bool;
}

/// Requester that only counts requests. The test (or host loop) fires the
/// frames itself. Clones share one counter.
#[derive(Debug, Clone, Default)]
pub struct ManualFrames {
    requests: Rc<Cell<usize>>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total frames requested so far.
    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

impl FrameRequester for ManualFrames {
    fn request_frame(&mut self) -> bool {
        self.requests.set(self.requests.get() + 1);
        true
    }
}

/// Pending/scheduled/paused flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedrawState {
    pending: bool,
    scheduled: bool,
    paused: bool,
}

impl RedrawState {
    /// Record a request. Returns true when a frame callback must be armed.
    pub fn request(&mut self) -> bool {
        self.pending = true;
        self.arm()
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Returns true when a pending redraw must now be armed.
    pub fn resume(&mut self) -> bool {
        self.paused = false;
        self.pending && self.arm()
    }

    /// Called as the frame callback starts, before drawing, so requests
    /// made while drawing arm a new frame.
    pub fn begin_frame(&mut self) {
        self.pending = false;
        self.scheduled = false;
    }

    /// The host could not schedule the armed frame. The request stays
    /// pending so the next one re-arms.
    pub fn disarm(&mut self) {
        self.scheduled = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    fn arm(&mut self) -> bool {
        if self.paused || self.scheduled {
            return false;
        }
        self.scheduled = true;
        true
    }
}
