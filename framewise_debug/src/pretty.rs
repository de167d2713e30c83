// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Times are
//! printed in milliseconds, as reported by the scheduler's time source.

use std::io::Write;

use framewise_core::trace::{
    FaultEvent, FrameSummary, PhaseBeginEvent, PhaseEndEvent, TickEvent, TimeoutsEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_tick(&mut self, e: &TickEvent) {
        let _ = writeln!(
            self.writer,
            "[tick] frame={} now={:.1}ms elapsed={:.1}ms",
            e.frame_index, e.now, e.elapsed,
        );
    }

    fn on_timeouts(&mut self, e: &TimeoutsEvent) {
        let _ = writeln!(
            self.writer,
            "[timeouts] frame={} fired={} remaining={}",
            e.frame_index, e.fired, e.remaining,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {} pending={} at {:.1}ms",
            e.frame_index, e.phase, e.pending, e.timestamp,
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} ran={} repeated={} failed={} at {:.1}ms",
            e.frame_index, e.phase, e.ran, e.repeated, e.failed, e.timestamp,
        );
    }

    fn on_fault(&mut self, e: &FaultEvent) {
        let _ = writeln!(
            self.writer,
            "[fault] frame={} origin={}",
            e.frame_index, e.origin,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} ran={} failed={} timeouts={} took={:.1}ms",
            s.frame_index,
            s.total_ran(),
            s.failed,
            s.timeouts_fired,
            s.duration,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framewise_core::{Origin, Phase};

    fn lines(sink: PrettyPrintSink<Vec<u8>>) -> Vec<String> {
        let bytes = sink.into_inner();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn one_line_per_event() {
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        sink.on_tick(&TickEvent {
            frame_index: 7,
            now: 1_016.0,
            elapsed: 16.0,
        });
        sink.on_phase_begin(&PhaseBeginEvent {
            frame_index: 7,
            phase: Phase::Update,
            timestamp: 1_016.3,
            pending: 3,
        });
        sink.on_fault(&FaultEvent {
            frame_index: 7,
            origin: Origin::Sync(Phase::Write),
        });

        assert_eq!(
            lines(sink),
            [
                "[tick] frame=7 now=1016.0ms elapsed=16.0ms",
                "[phase:begin] frame=7 update pending=3 at 1016.3ms",
                "[fault] frame=7 origin=sync write",
            ]
        );
    }

    #[test]
    fn summary_line_totals_phases() {
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        sink.on_frame_summary(&FrameSummary {
            frame_index: 2,
            now: 0.0,
            elapsed: 16.0,
            timeouts_fired: 1,
            ran: [1, 2, 0, 3, 0],
            failed: 0,
            duration: 0.5,
        });
        assert_eq!(
            lines(sink),
            ["[summary] frame=2 ran=6 failed=0 timeouts=1 took=0.5ms"]
        );
    }
}
