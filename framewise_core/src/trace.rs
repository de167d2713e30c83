// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the frame loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! scheduler calls at each stage of a tick. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! A sink is installed with
//! [`Scheduler::set_trace_sink`](crate::Scheduler::set_trace_sink). When the
//! `trace` feature is **off**, installing is a no-op and every emit point
//! compiles to nothing. When **on**, each emit point performs a single
//! `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] collects per-phase counts during a tick and
//! produces a [`FrameSummary`] at the end.

use alloc::boxed::Box;
use core::cell::RefCell;

use crate::error::Origin;
use crate::phase::Phase;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted at the start of every tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickEvent {
    /// Monotonic tick counter, starting at 0 for the scheduler's first tick.
    pub frame_index: u64,
    /// Time sampled for this tick, in milliseconds.
    pub now: f64,
    /// Elapsed time handed to the update phase, in milliseconds.
    pub elapsed: f64,
}

/// Emitted after due timeouts ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeoutsEvent {
    /// Tick counter.
    pub frame_index: u64,
    /// Number of timeouts that fired this tick.
    pub fired: usize,
    /// Number of timeouts still waiting.
    pub remaining: usize,
}

/// Marks the beginning of a phase flush.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseBeginEvent {
    /// Tick counter.
    pub frame_index: u64,
    /// Which phase is flushing.
    pub phase: Phase,
    /// Time at which the flush began.
    pub timestamp: f64,
    /// Size of the snapshot about to run.
    pub pending: usize,
}

/// Marks the end of a phase flush.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PhaseEndEvent {
    /// Tick counter.
    pub frame_index: u64,
    /// Which phase flushed.
    pub phase: Phase,
    /// Time at which the flush ended.
    pub timestamp: f64,
    /// Callbacks invoked.
    pub ran: usize,
    /// Callbacks that asked to run again next flush.
    pub repeated: usize,
    /// Callbacks that failed.
    pub failed: usize,
}

/// Emitted whenever a callback failure is contained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultEvent {
    /// Tick counter of the tick in progress (or of the last tick, for failures
    /// outside a tick, such as sync-mode runs).
    pub frame_index: u64,
    /// Where the failing callback was registered.
    pub origin: Origin,
}

/// Per-tick summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSummary {
    /// Tick counter.
    pub frame_index: u64,
    /// Time sampled for this tick.
    pub now: f64,
    /// Elapsed time handed to the update phase.
    pub elapsed: f64,
    /// Timeouts fired.
    pub timeouts_fired: usize,
    /// Callbacks invoked per phase, indexed by [`Phase::index`].
    pub ran: [usize; Phase::COUNT],
    /// Callbacks that failed across the whole tick, timeouts included.
    pub failed: usize,
    /// Wall time spent in the tick, in milliseconds.
    pub duration: f64,
}

impl FrameSummary {
    /// Total callbacks invoked across all phases.
    #[must_use]
    pub fn total_ran(&self) -> usize {
        self.ran.iter().sum()
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the frame loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the start of a tick.
    fn on_tick(&mut self, e: &TickEvent) {
        _ = e;
    }

    /// Called after due timeouts ran.
    fn on_timeouts(&mut self, e: &TimeoutsEvent) {
        _ = e;
    }

    /// Called before a non-empty phase flushes.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called after a non-empty phase flushed.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a callback failure is contained.
    fn on_fault(&mut self, e: &FaultEvent) {
        _ = e;
    }

    /// Called with the per-tick summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer slot
// ---------------------------------------------------------------------------

/// Holds the scheduler's installed sink.
///
/// When the `trace` feature is **off**, this is empty and [`emit`](Self::emit)
/// compiles to nothing.
#[derive(Default)]
pub(crate) struct Tracer {
    #[cfg(feature = "trace")]
    sink: RefCell<Option<Box<dyn TraceSink>>>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<RefCell<Option<Box<dyn TraceSink>>>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Tracer {
    pub(crate) fn install(&self, sink: Box<dyn TraceSink>) {
        #[cfg(feature = "trace")]
        {
            *self.sink.borrow_mut() = Some(sink);
        }
        #[cfg(not(feature = "trace"))]
        {
            drop(sink);
        }
    }

    pub(crate) fn remove(&self) -> Option<Box<dyn TraceSink>> {
        #[cfg(feature = "trace")]
        {
            self.sink.borrow_mut().take()
        }
        #[cfg(not(feature = "trace"))]
        {
            None
        }
    }

    /// Dispatches to the installed sink, if any.
    ///
    /// A sink that re-enters the scheduler and triggers a nested event does
    /// not see the nested event.
    #[inline]
    pub(crate) fn emit(&self, f: impl FnOnce(&mut dyn TraceSink)) {
        #[cfg(feature = "trace")]
        if let Ok(mut slot) = self.sink.try_borrow_mut()
            && let Some(sink) = slot.as_mut()
        {
            f(&mut **sink);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = f;
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects per-phase counts during a tick and produces a [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    tick: TickEvent,
    timeouts_fired: usize,
    ran: [usize; Phase::COUNT],
    failed: usize,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for the given tick.
    #[must_use]
    pub fn new(tick: &TickEvent) -> Self {
        Self {
            tick: *tick,
            timeouts_fired: 0,
            ran: [0; Phase::COUNT],
            failed: 0,
        }
    }

    /// Records the timeout batch of this tick.
    pub fn timeouts(&mut self, fired: usize, failed: usize) {
        self.timeouts_fired = fired;
        self.failed += failed;
    }

    /// Records the end of a phase flush.
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        self.ran[e.phase.index()] = e.ran;
        self.failed += e.failed;
    }

    /// Consumes the builder and produces the final [`FrameSummary`], given
    /// the time at which the tick finished.
    #[must_use]
    pub fn finish(self, end: f64) -> FrameSummary {
        FrameSummary {
            frame_index: self.tick.frame_index,
            now: self.tick.now,
            elapsed: self.tick.elapsed,
            timeouts_fired: self.timeouts_fired,
            ran: self.ran,
            failed: self.failed,
            duration: (end - self.tick.now).max(0.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tick() -> TickEvent {
        TickEvent {
            frame_index: 42,
            now: 1_000.0,
            elapsed: 16.0,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_tick(&sample_tick());
        sink.on_phase_begin(&PhaseBeginEvent {
            frame_index: 42,
            phase: Phase::Update,
            timestamp: 1_000.0,
            pending: 3,
        });
        sink.on_fault(&FaultEvent {
            frame_index: 42,
            origin: Origin::Timeout,
        });
    }

    #[test]
    fn empty_tracer_does_nothing() {
        let tracer = Tracer::default();
        let mut called = false;
        tracer.emit(|_| called = true);
        assert!(!called, "no sink installed");
        assert!(tracer.remove().is_none(), "nothing to remove");
    }

    #[test]
    fn summary_builder_accumulates() {
        let mut builder = FrameSummaryBuilder::new(&sample_tick());
        builder.timeouts(2, 1);
        builder.phase_end(&PhaseEndEvent {
            frame_index: 42,
            phase: Phase::Update,
            timestamp: 1_002.0,
            ran: 5,
            repeated: 3,
            failed: 1,
        });
        builder.phase_end(&PhaseEndEvent {
            frame_index: 42,
            phase: Phase::Write,
            ran: 2,
            ..PhaseEndEvent::default()
        });

        let summary = builder.finish(1_004.5);
        assert_eq!(summary.frame_index, 42);
        assert_eq!(summary.timeouts_fired, 2);
        assert_eq!(summary.ran, [0, 5, 0, 2, 0]);
        assert_eq!(summary.total_ran(), 7);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.duration, 4.5);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::rc::Rc;
        use alloc::vec::Vec;

        struct RecordingSink {
            ticks: Rc<RefCell<Vec<u64>>>,
        }
        impl TraceSink for RecordingSink {
            fn on_tick(&mut self, e: &TickEvent) {
                self.ticks.borrow_mut().push(e.frame_index);
            }
        }

        let ticks = Rc::new(RefCell::new(Vec::new()));
        let tracer = Tracer::default();
        tracer.install(Box::new(RecordingSink {
            ticks: Rc::clone(&ticks),
        }));
        tracer.emit(|sink| sink.on_tick(&sample_tick()));
        assert_eq!(*ticks.borrow(), [42]);
        assert!(tracer.remove().is_some(), "sink was installed");
    }
}
