//! `requestAnimationFrame` scheduling for a shared surface.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wassily_scene::{FrameRequester, Surface};

/// Where the frame callback finds its surface. Bound once the surface
/// exists, since the surface owns the requester.
#[derive(Clone, Default)]
pub struct SurfaceSlot(Rc<RefCell<Weak<RefCell<Surface>>>>);

impl SurfaceSlot {
    pub fn bind(&self, surface: &Rc<RefCell<Surface>>) {
        *self.0.borrow_mut() = Rc::downgrade(surface);
    }
}

pub struct AnimationFrames {
    slot: SurfaceSlot,
}

impl AnimationFrames {
    pub fn new(slot: SurfaceSlot) -> Self {
        Self { slot }
    }
}

impl FrameRequester for AnimationFrames {
    fn request_frame(&mut self) -> bool {
        let surface = self.slot.0.borrow().clone();
        schedule(surface)
    }
}

/// Queue one `animation_frame` call. A surface that is still borrowed when
/// the callback fires (a handler running) gets the frame one tick later.
fn schedule(surface: Weak<RefCell<Surface>>) -> bool {
    let Some(window) = web_sys::window() else {
        log::warn!("no window, cannot schedule a frame");
        return false;
    };
    let pending = surface.clone();
    let callback = Closure::once_into_js(move || {
        let Some(shared) = pending.upgrade() else {
            return;
        };
        let Ok(mut surface) = shared.try_borrow_mut() else {
            log::debug!("surface busy, frame postponed");
            if !schedule(pending) {
                log::warn!("frame dropped");
            }
            return;
        };
        surface.animation_frame();
    });
    match window.request_animation_frame(callback.unchecked_ref()) {
        Ok(_) => true,
        Err(err) => {
            log::warn!("requestAnimationFrame failed: {err:?}");
            false
        }
    }
}
