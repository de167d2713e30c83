// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Callback failures and their isolation.
//!
//! The scheduler itself has no failure modes: it performs no I/O and parses
//! nothing. The only error is a caller-supplied callback failing, either by
//! returning `Err` or (with the `std` feature) by panicking. Every invocation
//! is isolated: the failure is wrapped in a [`Fault`] and handed to the error
//! handler installed with
//! [`Scheduler::set_error_handler`](crate::Scheduler::set_error_handler), and
//! sibling callbacks keep running.

use alloc::boxed::Box;
use alloc::string::String;
use core::error::Error;
use core::fmt;

use crate::phase::Phase;

/// Why a single callback invocation failed.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    /// The callback returned an error.
    #[error("{0}")]
    Failed(Box<dyn Error + 'static>),
    /// The callback panicked. Holds the panic message when it was a string.
    #[error("callback panicked: {0}")]
    Panicked(String),
    /// The callback was invoked while it was already running, e.g. a task that
    /// schedules itself from inside [`Scheduler::sync`](crate::Scheduler::sync).
    #[error("callback invoked while it was already running")]
    Reentered,
}

impl CallbackError {
    /// Wraps any error (or string message) returned by a callback.
    pub fn new(error: impl Into<Box<dyn Error + 'static>>) -> Self {
        Self::Failed(error.into())
    }
}

/// Where a failing callback was registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    /// A handler registered with
    /// [`Scheduler::set_timeout`](crate::Scheduler::set_timeout).
    Timeout,
    /// A task flushed from a phase queue.
    Phase(Phase),
    /// A task run immediately because it was scheduled in sync mode.
    Sync(Phase),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::Phase(phase) => write!(f, "{phase} phase"),
            Self::Sync(phase) => write!(f, "sync {phase}"),
        }
    }
}

/// A contained callback failure, as delivered to the error handler.
#[derive(Debug, thiserror::Error)]
#[error("{origin} callback failed")]
pub struct Fault {
    /// Where the callback was registered.
    pub origin: Origin,
    /// What went wrong.
    #[source]
    pub error: CallbackError,
}

/// Default error handler: logs the fault and moves on.
pub(crate) fn log_fault(fault: Fault) {
    tracing::error!(origin = %fault.origin, error = %fault.error, "frame callback failed");
}

/// Runs one callback invocation, turning a panic into [`CallbackError::Panicked`].
///
/// Without the `std` feature panics are not caught.
pub(crate) fn isolate<T>(f: impl FnOnce() -> Result<T, CallbackError>) -> Result<T, CallbackError> {
    #[cfg(feature = "std")]
    {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(f))
            .unwrap_or_else(|payload| Err(CallbackError::Panicked(panic_message(&*payload))))
    }
    #[cfg(not(feature = "std"))]
    {
        f()
    }
}

#[cfg(feature = "std")]
fn panic_message(payload: &(dyn core::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        String::from(*s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("non-string panic payload")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn origin_display() {
        assert_eq!(Origin::Timeout.to_string(), "timeout");
        assert_eq!(Origin::Phase(Phase::Write).to_string(), "write phase");
        assert_eq!(Origin::Sync(Phase::Update).to_string(), "sync update");
    }

    #[test]
    fn failed_displays_inner_message() {
        let err = CallbackError::new("bad frame");
        assert_eq!(err.to_string(), "bad frame");
    }

    #[test]
    fn fault_exposes_source() {
        let fault = Fault {
            origin: Origin::Phase(Phase::Start),
            error: CallbackError::Reentered,
        };
        assert_eq!(fault.to_string(), "start phase callback failed");
        let source = fault.source().map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("callback invoked while it was already running")
        );
    }

    #[test]
    fn isolate_passes_results_through() {
        let ok = isolate(|| Ok::<_, CallbackError>(7));
        assert!(matches!(ok, Ok(7)), "ok result should pass through");
        let err = isolate(|| Err::<(), _>(CallbackError::Reentered));
        assert!(matches!(err, Err(CallbackError::Reentered)), "error should pass through");
    }

    #[cfg(feature = "std")]
    #[test]
    fn isolate_catches_panics() {
        let result = isolate(|| -> Result<(), CallbackError> { panic!("boom") });
        match result {
            Err(CallbackError::Panicked(msg)) => assert_eq!(msg, "boom"),
            other => panic!("expected a caught panic, got {other:?}"),
        }
    }
}
