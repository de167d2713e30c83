// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot delayed callbacks.
//!
//! Timeouts live in a single list sorted by due time. Insertion binary-searches
//! for the slot after every entry due at or before the new one, so entries with
//! equal due times keep their registration order. Each tick pops the due prefix
//! and runs it before any phase is flushed.

use alloc::boxed::Box;
use alloc::rc::Weak;
use alloc::vec::Vec;
use core::fmt;
use core::mem;

use crate::error::CallbackError;
use crate::scheduler::Inner;

/// Opaque identifier of a registered timeout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeoutId(u64);

pub(crate) type TimeoutFn = Box<dyn FnOnce() -> Result<(), CallbackError>>;

pub(crate) struct TimeoutEntry {
    pub(crate) due: f64,
    pub(crate) id: TimeoutId,
    pub(crate) handler: TimeoutFn,
}

impl fmt::Debug for TimeoutEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeoutEntry")
            .field("due", &self.due)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Timeouts sorted ascending by due time.
#[derive(Debug, Default)]
pub(crate) struct TimeoutList {
    entries: Vec<TimeoutEntry>,
    next_id: u64,
}

impl TimeoutList {
    /// Inserts a handler due at `due` and returns its id.
    pub(crate) fn insert(&mut self, due: f64, handler: TimeoutFn) -> TimeoutId {
        let id = TimeoutId(self.next_id);
        self.next_id += 1;
        let index = self.entries.partition_point(|e| e.due <= due);
        self.entries.insert(index, TimeoutEntry { due, id, handler });
        id
    }

    /// Removes the entry with `id`. Returns whether it was still pending.
    pub(crate) fn cancel(&mut self, id: TimeoutId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn contains(&self, id: TimeoutId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Removes and returns every entry due at or before `now`, earliest first.
    pub(crate) fn take_due(&mut self, now: f64) -> Vec<TimeoutEntry> {
        let count = self.entries.partition_point(|e| e.due <= now);
        self.entries.drain(..count).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes and returns every entry. Ids keep counting up, so stale handles
    /// stay inert.
    pub(crate) fn clear(&mut self) -> Vec<TimeoutEntry> {
        mem::take(&mut self.entries)
    }
}

/// Handle to a pending timeout, returned by
/// [`Scheduler::set_timeout`](crate::Scheduler::set_timeout).
///
/// Dropping the handle does not cancel the timeout.
#[derive(Clone)]
pub struct TimeoutHandle {
    id: TimeoutId,
    due: f64,
    scheduler: Weak<Inner>,
}

impl TimeoutHandle {
    pub(crate) fn new(id: TimeoutId, due: f64, scheduler: Weak<Inner>) -> Self {
        Self { id, due, scheduler }
    }

    /// The timeout's identifier.
    #[must_use]
    pub fn id(&self) -> TimeoutId {
        self.id
    }

    /// Time (per the scheduler's time source) at or after which it fires.
    #[must_use]
    pub fn due(&self) -> f64 {
        self.due
    }

    /// Removes the timeout without running it.
    ///
    /// Returns `false` if it already fired, was cleared, or was cancelled
    /// before.
    pub fn cancel(&self) -> bool {
        match self.scheduler.upgrade() {
            Some(inner) => inner.cancel_timeout(self.id),
            None => false,
        }
    }

    /// Returns `true` while the timeout is waiting to fire.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        match self.scheduler.upgrade() {
            Some(inner) => inner.has_timeout(self.id),
            None => false,
        }
    }
}

impl fmt::Debug for TimeoutHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeoutHandle")
            .field("id", &self.id)
            .field("due", &self.due)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn noop() -> TimeoutFn {
        Box::new(|| Ok(()))
    }

    fn ids(entries: &[TimeoutEntry]) -> Vec<TimeoutId> {
        entries.iter().map(|e| e.id).collect()
    }

    #[test]
    fn sorted_by_due_time() {
        let mut list = TimeoutList::default();
        let late = list.insert(30.0, noop());
        let early = list.insert(10.0, noop());
        let middle = list.insert(20.0, noop());
        let due = list.take_due(100.0);
        assert_eq!(ids(&due), vec![early, middle, late]);
    }

    #[test]
    fn equal_due_times_keep_insertion_order() {
        let mut list = TimeoutList::default();
        let a = list.insert(10.0, noop());
        let b = list.insert(5.0, noop());
        let c = list.insert(10.0, noop());
        let d = list.insert(10.0, noop());
        assert_eq!(ids(&list.take_due(10.0)), vec![b, a, c, d]);
    }

    #[test]
    fn take_due_leaves_future_entries() {
        let mut list = TimeoutList::default();
        let now = list.insert(10.0, noop());
        let later = list.insert(10.5, noop());
        assert_eq!(ids(&list.take_due(10.0)), vec![now]);
        assert_eq!(list.len(), 1);
        assert!(list.contains(later), "later entry still pending");
    }

    #[test]
    fn cancel_removes_once() {
        let mut list = TimeoutList::default();
        let a = list.insert(10.0, noop());
        let b = list.insert(20.0, noop());
        assert!(list.cancel(a), "pending entry is removed");
        assert!(!list.cancel(a), "second cancel is a no-op");
        assert_eq!(ids(&list.take_due(100.0)), vec![b]);
        assert!(!list.cancel(b), "fired entry cannot be cancelled");
    }

    #[test]
    fn ids_survive_clear() {
        let mut list = TimeoutList::default();
        let stale = list.insert(10.0, noop());
        assert_eq!(ids(&list.clear()), vec![stale]);
        let fresh = list.insert(10.0, noop());
        assert_ne!(stale, fresh);
        assert!(!list.cancel(stale), "stale id must not match new entries");
        assert!(list.contains(fresh), "fresh entry untouched");
    }
}
