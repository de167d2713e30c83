// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame clocks.
//!
//! A [`FrameClock`] arranges for a callback to run once, at the next frame
//! boundary. The scheduler asks for one frame at a time and re-requests from
//! inside every frame while its loop is running.
//!
//! The core crate ships no platform clock: [`NoopClock`] (never delivers a
//! frame) is the default, suitable for headless hosts. Platform crates provide
//! real ones, e.g. `framewise_web::RafClock` on top of
//! `requestAnimationFrame`. [`ManualClock`] lets tests, simulations, and hosts
//! with their own vsync callback deliver frames by hand.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::mem;

/// Callback handed to a [`FrameClock`].
pub type FrameCallback = Box<dyn FnOnce()>;

/// Delivers frame callbacks.
///
/// Implementations must invoke the callback asynchronously, after
/// `request_frame` has returned. Calling it from inside `request_frame` would
/// recurse into the next frame immediately.
///
/// Any `Fn(FrameCallback)` closure is a frame clock.
pub trait FrameClock {
    /// Arranges for `callback` to run once at the next frame boundary.
    fn request_frame(&self, callback: FrameCallback);
}

impl<F> FrameClock for F
where
    F: Fn(FrameCallback),
{
    fn request_frame(&self, callback: FrameCallback) {
        self(callback);
    }
}

/// A clock that never delivers frames.
///
/// Registrations still queue up; they just never flush.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopClock;

impl FrameClock for NoopClock {
    fn request_frame(&self, callback: FrameCallback) {
        drop(callback);
    }
}

/// A clock whose frames are delivered by calling [`ManualClock::frame`].
///
/// Clones share the same pending callbacks.
#[derive(Clone, Default)]
pub struct ManualClock {
    pending: Rc<RefCell<Vec<FrameCallback>>>,
    delivered: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Creates a clock with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks waiting for the next frame.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Number of frames delivered so far.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.delivered.get()
    }

    /// Delivers one frame.
    ///
    /// Runs every callback requested before this call. Callbacks requested
    /// while the frame runs wait for the next one. Returns how many ran.
    pub fn frame(&self) -> usize {
        let due = mem::take(&mut *self.pending.borrow_mut());
        self.delivered.set(self.delivered.get() + 1);
        let count = due.len();
        for callback in due {
            callback();
        }
        count
    }

    /// Drops every pending callback without running it.
    pub fn discard(&self) {
        self.pending.borrow_mut().clear();
    }
}

impl FrameClock for ManualClock {
    fn request_frame(&self, callback: FrameCallback) {
        self.pending.borrow_mut().push(callback);
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock")
            .field("pending", &self.pending())
            .field("delivered", &self.delivered())
            .finish()
    }
}
