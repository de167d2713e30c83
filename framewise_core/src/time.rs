// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time sources and frame delta computation.
//!
//! All times are `f64` milliseconds, matching `performance.now()` and the
//! `DOMHighResTimeStamp` handed to `requestAnimationFrame` callbacks. Only
//! differences between readings of the same source are meaningful.
//!
//! [`TimeSource`] is the injection seam. With the `std` feature,
//! [`MonotonicTime`] (backed by [`std::time::Instant`]) is the default and
//! [`WallTime`] is the coarse fallback. [`ManualTime`] is a settable source
//! for tests and simulations.

use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;

/// Largest elapsed time reported to the update phase, in milliseconds.
///
/// Long gaps (a suspended tab, a debugger pause) are clamped so animation
/// math never sees a huge step.
pub const MAX_ELAPSED_MS: f64 = 64.0;

/// Elapsed time reported on the first tick after the loop starts, when there
/// is no previous sample.
pub const FIRST_FRAME_ELAPSED_MS: f64 = 1000.0 / 60.0;

/// A monotonically non-decreasing millisecond clock.
pub trait TimeSource {
    /// Returns the current time in milliseconds.
    fn now(&self) -> f64;
}

/// Computes the elapsed time for a tick sampled at `now`.
///
/// Returns `first_frame` when there is no previous sample, otherwise the
/// difference clamped to at most `max`.
#[inline]
#[must_use]
pub fn frame_elapsed(previous: Option<f64>, now: f64, max: f64, first_frame: f64) -> f64 {
    match previous {
        Some(previous) => (now - previous).min(max),
        None => first_frame,
    }
}

/// A time source whose value is set by hand.
///
/// Clones share the same reading, so a test can keep one clone while the
/// scheduler owns another.
#[derive(Clone, Default)]
pub struct ManualTime {
    now: Rc<Cell<f64>>,
}

impl ManualTime {
    /// Creates a source reading `start` milliseconds.
    #[must_use]
    pub fn new(start: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Sets the current reading.
    pub fn set(&self, now: f64) {
        self.now.set(now);
    }

    /// Moves the reading forward by `ms` and returns the new value.
    pub fn advance(&self, ms: f64) -> f64 {
        let now = self.now.get() + ms;
        self.now.set(now);
        now
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

impl fmt::Debug for ManualTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ManualTime({})", self.now.get())
    }
}

/// High-resolution monotonic time, measured from when the source was created.
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug)]
pub struct MonotonicTime {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicTime {
    /// Creates a source reading zero now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicTime {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Wall-clock milliseconds since the Unix epoch.
///
/// Coarser than [`MonotonicTime`] and may jump if the system clock is
/// adjusted; readings before the epoch are reported as zero.
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug, Default)]
pub struct WallTime;

#[cfg(feature = "std")]
impl TimeSource for WallTime {
    fn now(&self) -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0.0, |d| d.as_secs_f64() * 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_uses_default() {
        let dt = frame_elapsed(None, 500.0, MAX_ELAPSED_MS, FIRST_FRAME_ELAPSED_MS);
        assert_eq!(dt, FIRST_FRAME_ELAPSED_MS);
    }

    #[test]
    fn elapsed_is_difference() {
        let dt = frame_elapsed(Some(100.0), 116.0, MAX_ELAPSED_MS, FIRST_FRAME_ELAPSED_MS);
        assert_eq!(dt, 16.0);
    }

    #[test]
    fn long_gaps_are_clamped() {
        let dt = frame_elapsed(Some(0.0), 5_000.0, MAX_ELAPSED_MS, FIRST_FRAME_ELAPSED_MS);
        assert_eq!(dt, MAX_ELAPSED_MS);
    }

    #[test]
    fn manual_time_clones_share_reading() {
        let time = ManualTime::new(10.0);
        let other = time.clone();
        assert_eq!(time.advance(5.0), 15.0);
        assert_eq!(other.now(), 15.0);
        other.set(40.0);
        assert_eq!(time.now(), 40.0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn monotonic_time_does_not_go_backwards() {
        let time = MonotonicTime::new();
        let a = time.now();
        let b = time.now();
        assert!(b >= a, "{b} < {a}");
    }
}
