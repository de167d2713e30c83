// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads events recorded by a
//! [`RecorderSink`](super::recorder::RecorderSink) and writes
//! [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::RecordedEvent;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Phase flushes become begin/end pairs and each frame summary becomes a
/// complete event spanning the tick. Events that carry no time of their own
/// (timeouts, faults) are stamped with the time of the tick they belong to.
pub fn export(events: &[RecordedEvent], writer: &mut dyn Write) -> io::Result<()> {
    let mut out: Vec<Value> = Vec::with_capacity(events.len());
    let mut tick_now = 0.0;

    for recorded in events {
        match recorded {
            RecordedEvent::Tick(e) => {
                tick_now = e.now;
                out.push(json!({
                    "ph": "i",
                    "name": "Tick",
                    "cat": "Scheduler",
                    "ts": ms_to_us(e.now),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                        "elapsed_ms": e.elapsed,
                    }
                }));
            }
            RecordedEvent::Timeouts(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": "Timeouts",
                    "cat": "Scheduler",
                    "ts": ms_to_us(tick_now),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "fired": e.fired,
                        "remaining": e.remaining,
                    }
                }));
            }
            RecordedEvent::PhaseBegin(e) => {
                out.push(json!({
                    "ph": "B",
                    "name": e.phase.name(),
                    "cat": "Phase",
                    "ts": ms_to_us(e.timestamp),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                        "pending": e.pending,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                out.push(json!({
                    "ph": "E",
                    "name": e.phase.name(),
                    "cat": "Phase",
                    "ts": ms_to_us(e.timestamp),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                        "ran": e.ran,
                        "repeated": e.repeated,
                        "failed": e.failed,
                    }
                }));
            }
            RecordedEvent::Fault(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": "Fault",
                    "cat": "Error",
                    "ts": ms_to_us(tick_now),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "origin": e.origin.to_string(),
                    }
                }));
            }
            RecordedEvent::FrameSummary(s) => {
                out.push(json!({
                    "ph": "X",
                    "name": "Frame",
                    "cat": "Summary",
                    "ts": ms_to_us(s.now),
                    "dur": ms_to_us(s.duration),
                    "pid": 0,
                    "tid": 1,
                    "args": {
                        "frame_index": s.frame_index,
                        "elapsed_ms": s.elapsed,
                        "timeouts_fired": s.timeouts_fired,
                        "ran": s.total_ran(),
                        "failed": s.failed,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &out)?;
    Ok(())
}

fn ms_to_us(ms: f64) -> f64 {
    ms * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use framewise_core::Phase;
    use framewise_core::trace::{PhaseBeginEvent, PhaseEndEvent, TickEvent, TraceSink};

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_tick(&TickEvent {
            frame_index: 0,
            now: 1_000.0,
            elapsed: 16.0,
        });
        rec.on_phase_begin(&PhaseBeginEvent {
            frame_index: 0,
            phase: Phase::Write,
            timestamp: 1_000.0,
            pending: 2,
        });
        rec.on_phase_end(&PhaseEndEvent {
            frame_index: 0,
            phase: Phase::Write,
            timestamp: 1_000.5,
            ran: 2,
            ..PhaseEndEvent::default()
        });

        let mut out = Vec::new();
        export(&rec.events(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        // Should parse as a JSON array.
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "Tick");
        assert_eq!(parsed[0]["ts"], 1_000_000.0);

        assert_eq!(parsed[1]["ph"], "B");
        assert_eq!(parsed[1]["name"], "write");

        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["ts"], 1_000_500.0);
        assert_eq!(parsed[2]["args"]["ran"], 2);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
