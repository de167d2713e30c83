// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Callback handles and the repeat contract.
//!
//! A [`Task`] is a shareable handle to a callback. Its identity is the handle:
//! clones refer to the same callback, so scheduling a clone of a queued task is
//! a no-op, while two tasks built from identical closures are independent.
//!
//! Callbacks report what should happen next through [`IntoFlow`]. Returning
//! [`Flow::Repeat`] (or `true`) keeps the task queued for the *next* flush of
//! its phase; [`Flow::Done`], `false`, or `()` drop it. Returning `Err` is a
//! failure that gets reported to the error handler.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::error::Error;
use core::fmt;

use crate::error::CallbackError;

/// What a callback wants after it ran.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Flow {
    /// Drop the callback from its queue.
    #[default]
    Done,
    /// Run the callback again on the next flush of the same phase.
    Repeat,
}

/// Conversion from a callback's return value into a [`Flow`].
pub trait IntoFlow {
    /// Converts `self`, turning `Err` into a [`CallbackError`].
    fn into_flow(self) -> Result<Flow, CallbackError>;
}

impl IntoFlow for Flow {
    #[inline]
    fn into_flow(self) -> Result<Flow, CallbackError> {
        Ok(self)
    }
}

impl IntoFlow for () {
    #[inline]
    fn into_flow(self) -> Result<Flow, CallbackError> {
        Ok(Flow::Done)
    }
}

impl IntoFlow for bool {
    #[inline]
    fn into_flow(self) -> Result<Flow, CallbackError> {
        Ok(if self { Flow::Repeat } else { Flow::Done })
    }
}

impl<T, E> IntoFlow for Result<T, E>
where
    T: IntoFlow,
    E: Into<Box<dyn Error + 'static>>,
{
    #[inline]
    fn into_flow(self) -> Result<Flow, CallbackError> {
        self.map_err(CallbackError::new)?.into_flow()
    }
}

type TaskFn = dyn FnMut(f64) -> Result<Flow, CallbackError>;

/// Identity of a [`Task`], stable while any clone of the task is alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TaskKey(usize);

/// A schedulable callback handle.
///
/// The callback receives an `f64`: the elapsed milliseconds when flushed from
/// [`Phase::Update`](crate::Phase::Update), and `0.0` everywhere else
/// (other phases, and immediate runs in sync mode).
#[derive(Clone)]
pub struct Task {
    callback: Rc<RefCell<TaskFn>>,
}

impl Task {
    /// Creates a task that takes the elapsed frame time in milliseconds.
    pub fn update<F, R>(mut f: F) -> Self
    where
        F: FnMut(f64) -> R + 'static,
        R: IntoFlow,
    {
        Self::from_fn(move |elapsed| f(elapsed).into_flow())
    }

    /// Creates a task that ignores its argument.
    pub fn frame<F, R>(mut f: F) -> Self
    where
        F: FnMut() -> R + 'static,
        R: IntoFlow,
    {
        Self::update(move |_| f())
    }

    pub(crate) fn from_fn(f: impl FnMut(f64) -> Result<Flow, CallbackError> + 'static) -> Self {
        Self {
            callback: Rc::new(RefCell::new(f)),
        }
    }

    /// Returns `true` if both handles refer to the same callback.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }

    #[inline]
    pub(crate) fn key(&self) -> TaskKey {
        TaskKey(Rc::as_ptr(&self.callback).cast::<()>() as usize)
    }

    /// Invokes the callback. A task that is already running reports
    /// [`CallbackError::Reentered`] instead of running twice.
    pub(crate) fn run(&self, arg: f64) -> Result<Flow, CallbackError> {
        let mut callback = self
            .callback
            .try_borrow_mut()
            .map_err(|_| CallbackError::Reentered)?;
        (*callback)(arg)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("key", &self.key().0)
            .finish_non_exhaustive()
    }
}
