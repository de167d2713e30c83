// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Execution phases of a frame.

use core::fmt;

/// One of the five ordered callback phases flushed on every tick.
///
/// Phases run in declaration order, after due timeouts:
/// `Start` → `Update` → `Frame` → `Write` → `Finish`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Runs before updates are flushed. Throttled calls land here.
    #[default]
    Start,
    /// Animation updates. Callbacks receive the elapsed milliseconds.
    Update,
    /// Runs after updates and before writes.
    Frame,
    /// Batched mutations of host state.
    Write,
    /// Runs after writes are flushed.
    Finish,
}

impl Phase {
    /// Number of phases.
    pub const COUNT: usize = 5;

    /// All phases in execution order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Start,
        Self::Update,
        Self::Frame,
        Self::Write,
        Self::Finish,
    ];

    /// Position of this phase in [`Phase::ALL`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Start => 0,
            Self::Update => 1,
            Self::Frame => 2,
            Self::Write => 3,
            Self::Finish => 4,
        }
    }

    /// Short lowercase name, as used in logs and trace output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Update => "update",
            Self::Frame => "frame",
            Self::Write => "write",
            Self::Finish => "finish",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
