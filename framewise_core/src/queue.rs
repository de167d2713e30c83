// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Double-buffered pending set for one phase.
//!
//! A flush swaps the pending set out as its snapshot and leaves a fresh empty
//! set behind. Everything added while the snapshot runs, whether a repeat or a
//! brand new registration, lands in the fresh set and waits for the next
//! flush, so a flush always terminates.

use alloc::vec::Vec;
use core::mem;

use hashbrown::HashSet;

use crate::task::{Task, TaskKey};

/// Insertion-ordered set of unique tasks.
#[derive(Debug, Default)]
pub(crate) struct PhaseQueue {
    pending: Vec<Task>,
    members: HashSet<TaskKey>,
}

impl PhaseQueue {
    /// Adds `task` unless it is already pending. Returns whether it was added.
    pub(crate) fn insert(&mut self, task: &Task) -> bool {
        if !self.members.insert(task.key()) {
            return false;
        }
        self.pending.push(task.clone());
        true
    }

    /// Removes `task` if pending. Returns whether it was removed.
    pub(crate) fn remove(&mut self, task: &Task) -> bool {
        let key = task.key();
        if !self.members.remove(&key) {
            return false;
        }
        self.pending.retain(|t| t.key() != key);
        true
    }

    pub(crate) fn contains(&self, task: &Task) -> bool {
        self.members.contains(&task.key())
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Swaps the pending set out for a fresh one and returns the snapshot.
    pub(crate) fn swap(&mut self) -> Vec<Task> {
        self.members.clear();
        mem::take(&mut self.pending)
    }
}
