// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and appends a copy of every event
//! to a shared log. The scheduler takes ownership of the sink it is given, so
//! keep a clone: clones share the same log.

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use framewise_core::trace::{
    FaultEvent, FrameSummary, PhaseBeginEvent, PhaseEndEvent, TickEvent, TimeoutsEvent, TraceSink,
};

/// One recorded trace event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A tick started.
    Tick(TickEvent),
    /// Due timeouts ran.
    Timeouts(TimeoutsEvent),
    /// A phase flush began.
    PhaseBegin(PhaseBeginEvent),
    /// A phase flush ended.
    PhaseEnd(PhaseEndEvent),
    /// A callback failure was contained.
    Fault(FaultEvent),
    /// Per-tick summary.
    FrameSummary(FrameSummary),
}

impl RecordedEvent {
    /// Tick counter the event belongs to.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        match self {
            Self::Tick(e) => e.frame_index,
            Self::Timeouts(e) => e.frame_index,
            Self::PhaseBegin(e) => e.frame_index,
            Self::PhaseEnd(e) => e.frame_index,
            Self::Fault(e) => e.frame_index,
            Self::FrameSummary(s) => s.frame_index,
        }
    }
}

/// Records trace events into a shared, growable log.
#[derive(Clone, Debug, Default)]
pub struct RecorderSink {
    events: Rc<RefCell<Vec<RecordedEvent>>>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&self) -> Vec<RecordedEvent> {
        mem::take(&mut *self.events.borrow_mut())
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    fn push(&self, event: RecordedEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl TraceSink for RecorderSink {
    fn on_tick(&mut self, e: &TickEvent) {
        self.push(RecordedEvent::Tick(*e));
    }

    fn on_timeouts(&mut self, e: &TimeoutsEvent) {
        self.push(RecordedEvent::Timeouts(*e));
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.push(RecordedEvent::PhaseBegin(*e));
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.push(RecordedEvent::PhaseEnd(*e));
    }

    fn on_fault(&mut self, e: &FaultEvent) {
        self.push(RecordedEvent::Fault(*e));
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.push(RecordedEvent::FrameSummary(*s));
    }
}
