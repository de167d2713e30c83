// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame call coalescing.

use alloc::rc::{Rc, Weak};
use core::cell::RefCell;
use core::fmt;

use crate::phase::Phase;
use crate::scheduler::{Inner, Scheduler};
use crate::task::{Flow, IntoFlow, Task};

/// A function wrapped so that bursts of calls run it at most once per frame.
///
/// Created by [`Scheduler::throttle`]. Each [`call`](Self::call) stores its
/// argument, replacing any earlier one, and makes sure a trampoline is queued
/// in [`Phase::Start`]. The trampoline takes the stored argument and runs the
/// wrapped function once. Use a tuple for several arguments.
///
/// Clones share the stored argument and the trampoline. A `Throttled` does
/// not keep its scheduler alive; once every [`Scheduler`] handle is dropped,
/// its methods do nothing.
pub struct Throttled<A> {
    args: Rc<RefCell<Option<A>>>,
    trampoline: Task,
    scheduler: Weak<Inner>,
}

impl<A: 'static> Throttled<A> {
    pub(crate) fn new<F, R>(scheduler: &Scheduler, mut f: F) -> Self
    where
        F: FnMut(A) -> R + 'static,
        R: IntoFlow,
    {
        let args = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&args);
        let trampoline = Task::from_fn(move |_| {
            // Taken before `f` runs so a call made from inside `f` survives.
            let latest = slot.borrow_mut().take();
            match latest {
                Some(latest) => f(latest).into_flow().map(|_| Flow::Done),
                None => Ok(Flow::Done),
            }
        });
        Self {
            args,
            trampoline,
            scheduler: scheduler.downgrade(),
        }
    }

    /// Stores `args` as the latest arguments and queues the trampoline.
    pub fn call(&self, args: A) {
        let Some(scheduler) = Scheduler::upgrade(&self.scheduler) else {
            return;
        };
        let previous = self.args.replace(Some(args));
        drop(previous);
        scheduler.on_start(&self.trampoline);
    }

    /// Dequeues the trampoline and discards the stored arguments.
    pub fn cancel(&self) {
        if let Some(scheduler) = Scheduler::upgrade(&self.scheduler) {
            scheduler.cancel(Phase::Start, &self.trampoline);
        }
        let stale = self.args.replace(None);
        drop(stale);
    }

    /// Returns `true` while a call waits for the next `Start` flush.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        Scheduler::upgrade(&self.scheduler)
            .is_some_and(|scheduler| scheduler.is_scheduled(Phase::Start, &self.trampoline))
    }
}

impl<A> Clone for Throttled<A> {
    fn clone(&self) -> Self {
        Self {
            args: Rc::clone(&self.args),
            trampoline: self.trampoline.clone(),
            scheduler: Weak::clone(&self.scheduler),
        }
    }
}

impl<A> fmt::Debug for Throttled<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttled")
            .field("has_args", &self.args.borrow().is_some())
            .field("trampoline", &self.trampoline)
            .finish_non_exhaustive()
    }
}
