// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for framewise.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`RafClock`]: `requestAnimationFrame` frame clock
//! - [`PerformanceTime`] / [`DateTime`]: `performance.now()` and `Date.now()`
//!   time sources
//! - [`install`]: wires the best available pair into a [`Scheduler`]

#![no_std]

mod raf;

pub use raf::{DateTime, PerformanceTime, RafClock};

use framewise_core::{NoopClock, Scheduler};

/// What [`install`] found in the host environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Installed {
    /// `true` if frames come from `requestAnimationFrame`; `false` means no
    /// `window` was found and the scheduler got a [`NoopClock`].
    pub animation_frames: bool,
    /// `true` if time comes from `performance.now()`; `false` means the
    /// `Date.now()` fallback.
    pub high_resolution_time: bool,
}

impl Installed {
    fn detect(has_window: bool, has_performance: bool) -> Self {
        Self {
            animation_frames: has_window,
            high_resolution_time: has_window && has_performance,
        }
    }
}

/// Installs the browser frame clock and time source into `scheduler`.
///
/// Uses `requestAnimationFrame` when a `window` exists and a clock that never
/// fires otherwise. Time comes from `performance.now()` when available,
/// falling back to `Date.now()`.
pub fn install(scheduler: &Scheduler) -> Installed {
    let window = web_sys::window();
    let has_performance = window.as_ref().is_some_and(|w| w.performance().is_some());
    let installed = Installed::detect(window.is_some(), has_performance);

    if installed.animation_frames {
        scheduler.use_clock(RafClock);
    } else {
        scheduler.use_clock(NoopClock);
    }
    if installed.high_resolution_time {
        scheduler.set_time_source(PerformanceTime);
    } else {
        scheduler.set_time_source(DateTime);
    }

    tracing::debug!(
        animation_frames = installed.animation_frames,
        high_resolution_time = installed.high_resolution_time,
        "web frame clock installed"
    );
    installed
}

/// Installs the browser backend into this thread's default scheduler.
pub fn install_default() -> Installed {
    install(&framewise_core::global::scheduler())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_with_performance_uses_both() {
        let installed = Installed::detect(true, true);
        assert!(installed.animation_frames, "raf available");
        assert!(installed.high_resolution_time, "performance available");
    }

    #[test]
    fn missing_performance_falls_back_to_date() {
        let installed = Installed::detect(true, false);
        assert!(installed.animation_frames, "raf available");
        assert!(!installed.high_resolution_time, "Date.now fallback");
    }

    #[test]
    fn no_window_gets_noop_clock() {
        assert_eq!(
            Installed::detect(false, false),
            Installed {
                animation_frames: false,
                high_resolution_time: false,
            }
        );
    }
}
