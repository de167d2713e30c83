// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cooperative per-frame task scheduler.
//!
//! `framewise_core` batches work requested by many independent callers into a
//! small number of ordered phases that run once per display refresh. It is
//! `no_std` compatible (with `alloc`); the `std` feature is on by default.
//!
//! # Architecture
//!
//! ```text
//!   FrameClock (injected: rAF, manual pump, ...)
//!       │ one callback per frame
//!       ▼
//!   Scheduler tick ──► due timeouts
//!                  ──► Start ──► Update(elapsed) ──► Frame ──► Write ──► Finish
//! ```
//!
//! **[`scheduler`]** — The [`Scheduler`] handle: registration, the frame loop
//! driver, flushing, sync mode, and lifecycle.
//!
//! **[`task`]** — [`Task`] callback handles and the [`Flow`] result that asks
//! for a repeat on the next flush.
//!
//! **[`phase`]** — The five [`Phase`]s in execution order.
//!
//! **[`timeout`]** — The sorted timeout list and [`TimeoutHandle`].
//!
//! **[`throttle`]** — [`Throttled`], which coalesces bursts of calls into one
//! call per frame.
//!
//! **[`clock`]** / **[`time`]** — The injected [`FrameClock`] and
//! [`TimeSource`] seams, with manual doubles for tests and host-pumped loops.
//!
//! **[`error`]** — [`CallbackError`] and [`Fault`], reported to the error
//! handler whenever a callback fails.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! frame-loop instrumentation.
//!
//! # Crate features
//!
//! - `std` (enabled by default): catches callback panics, provides
//!   [`MonotonicTime`](time::MonotonicTime) as the default time source, and
//!   the per-thread default scheduler in [`global`].
//! - `trace` (disabled by default): dispatches frame-loop events to the sink
//!   installed with [`Scheduler::set_trace_sink`].

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod clock;
pub mod error;
#[cfg(feature = "std")]
pub mod global;
pub mod phase;
mod queue;
pub mod scheduler;
pub mod task;
pub mod throttle;
pub mod time;
pub mod timeout;
pub mod trace;

pub use clock::{FrameClock, ManualClock, NoopClock};
pub use error::{CallbackError, Fault, Origin};
pub use phase::Phase;
pub use scheduler::{Scheduler, SchedulerConfig};
pub use task::{Flow, IntoFlow, Task};
pub use throttle::Throttled;
pub use time::{ManualTime, TimeSource};
pub use timeout::{TimeoutHandle, TimeoutId};
