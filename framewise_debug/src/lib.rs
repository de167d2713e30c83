// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for framewise frame
//! loops.
//!
//! This crate provides [`TraceSink`](framewise_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: in-memory recording, readable while the
//!   scheduler owns the sink.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from a
//!   recording.

pub mod chrome;
pub mod pretty;
pub mod recorder;
