// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-thread default scheduler.
//!
//! Each thread lazily gets its own [`Scheduler`]; the free functions here
//! forward to it. Hosts install their clock once at startup and every
//! component on the thread shares the same frame loop:
//!
//! ```
//! use framewise_core::{global, ManualClock, Task};
//!
//! let clock = ManualClock::new();
//! global::use_clock(clock.clone());
//! global::write(&Task::frame(|| println!("flushed")));
//! clock.frame();
//! global::clear();
//! ```

use alloc::boxed::Box;

use crate::clock::FrameClock;
use crate::error::Fault;
use crate::scheduler::Scheduler;
use crate::task::{IntoFlow, Task};
use crate::throttle::Throttled;
use crate::time::TimeSource;
use crate::timeout::TimeoutHandle;
use crate::trace::TraceSink;

std::thread_local! {
    static DEFAULT: Scheduler = Scheduler::new();
}

/// Returns a handle to this thread's default scheduler.
#[must_use]
pub fn scheduler() -> Scheduler {
    DEFAULT.with(Scheduler::clone)
}

/// See [`Scheduler::schedule`].
pub fn schedule(task: &Task) {
    scheduler().schedule(task);
}

/// See [`Scheduler::cancel_update`].
pub fn cancel_update(task: &Task) -> bool {
    scheduler().cancel_update(task)
}

/// See [`Scheduler::write`].
pub fn write(task: &Task) {
    scheduler().write(task);
}

/// See [`Scheduler::on_start`].
pub fn on_start(task: &Task) {
    scheduler().on_start(task);
}

/// See [`Scheduler::on_frame`].
pub fn on_frame(task: &Task) {
    scheduler().on_frame(task);
}

/// See [`Scheduler::on_finish`].
pub fn on_finish(task: &Task) {
    scheduler().on_finish(task);
}

/// See [`Scheduler::set_timeout`].
pub fn set_timeout<F, R>(handler: F, ms: f64) -> TimeoutHandle
where
    F: FnOnce() -> R + 'static,
    R: IntoFlow,
{
    scheduler().set_timeout(handler, ms)
}

/// See [`Scheduler::sync`].
pub fn sync(f: impl FnOnce()) {
    scheduler().sync(f);
}

/// See [`Scheduler::throttle`].
pub fn throttle<A, F, R>(f: F) -> Throttled<A>
where
    A: 'static,
    F: FnMut(A) -> R + 'static,
    R: IntoFlow,
{
    scheduler().throttle(f)
}

/// See [`Scheduler::idle`].
#[must_use]
pub fn idle() -> bool {
    scheduler().idle()
}

/// See [`Scheduler::clear`].
pub fn clear() {
    scheduler().clear();
}

/// See [`Scheduler::now`].
#[must_use]
pub fn now() -> f64 {
    scheduler().now()
}

/// See [`Scheduler::use_clock`].
pub fn use_clock(clock: impl FrameClock + 'static) {
    scheduler().use_clock(clock);
}

/// See [`Scheduler::set_time_source`].
pub fn set_time_source(source: impl TimeSource + 'static) {
    scheduler().set_time_source(source);
}

/// See [`Scheduler::set_batched_updates`].
pub fn set_batched_updates(hook: impl Fn(&mut dyn FnMut()) + 'static) {
    scheduler().set_batched_updates(hook);
}

/// See [`Scheduler::set_error_handler`].
pub fn set_error_handler(handler: impl Fn(Fault) + 'static) {
    scheduler().set_error_handler(handler);
}

/// See [`Scheduler::set_trace_sink`].
pub fn set_trace_sink(sink: impl TraceSink + 'static) {
    scheduler().set_trace_sink(sink);
}

/// See [`Scheduler::take_trace_sink`].
pub fn take_trace_sink() -> Option<Box<dyn TraceSink>> {
    scheduler().take_trace_sink()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::time::ManualTime;
    use alloc::rc::Rc;
    use core::cell::Cell;

    // Every test runs on its own thread, so each sees a fresh default.

    #[test]
    fn handles_share_one_scheduler() {
        let clock = ManualClock::new();
        use_clock(clock.clone());
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        schedule(&Task::frame(move || counter.set(counter.get() + 1)));
        assert!(!idle(), "task pending on the default scheduler");
        assert_eq!(scheduler().pending(crate::Phase::Update), 1);
        clock.frame();
        assert_eq!(hits.get(), 1);
        clear();
        assert!(!scheduler().is_running(), "cleared");
    }

    #[test]
    fn timeouts_use_installed_time() {
        let clock = ManualClock::new();
        let time = ManualTime::new(500.0);
        use_clock(clock.clone());
        set_time_source(time.clone());
        assert_eq!(now(), 500.0);
        let handle = set_timeout(|| (), 10.0);
        assert_eq!(handle.due(), 510.0);
        time.advance(10.0);
        clock.frame();
        assert!(idle(), "timeout fired");
    }

    #[test]
    fn other_threads_get_their_own_default() {
        schedule(&Task::frame(|| ()));
        let remote_idle = std::thread::spawn(idle).join();
        assert!(matches!(remote_idle, Ok(true)), "fresh scheduler on new thread");
        assert!(!idle(), "local default still busy");
        clear();
    }
}
