// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property-based invariant tests for the frame scheduler.
//!
//! 1. Timeouts fire in due order, ties in registration order.
//! 2. A task runs at most once per flush, however often it was registered.
//! 3. Elapsed time is bounded by the configured clamp.
//! 4. A task that repeats `k` times runs on exactly `k + 1` ticks.
//! 5. A burst of throttled calls collapses to one call with the last argument.
//! 6. `clear` always leaves the scheduler idle and stopped.

use std::cell::RefCell;
use std::rc::Rc;

use framewise_core::{ManualClock, ManualTime, Phase, Scheduler, Task};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn harness() -> (Scheduler, ManualClock, ManualTime) {
    let scheduler = Scheduler::new();
    let clock = ManualClock::new();
    let time = ManualTime::new(0.0);
    scheduler.use_clock(clock.clone());
    scheduler.set_time_source(time.clone());
    (scheduler, clock, time)
}

fn phase_strategy() -> impl Strategy<Value = Phase> {
    prop::sample::select(Phase::ALL.to_vec())
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Timeout ordering
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn timeouts_fire_in_stable_due_order(
        delays in prop::collection::vec(0u8..40, 1..40),
        steps in prop::collection::vec(1u8..30, 1..20),
    ) {
        let (scheduler, clock, time) = harness();
        let fired = Rc::new(RefCell::new(Vec::new()));
        for (index, delay) in delays.iter().enumerate() {
            let fired = Rc::clone(&fired);
            scheduler.set_timeout(move || fired.borrow_mut().push(index), f64::from(*delay));
        }

        for step in &steps {
            time.advance(f64::from(*step));
            clock.frame();
        }
        time.advance(100.0);
        clock.frame();

        let mut expected: Vec<usize> = (0..delays.len()).collect();
        expected.sort_by_key(|&index| delays[index]);
        prop_assert_eq!(&*fired.borrow(), &expected);
        prop_assert!(scheduler.idle(), "every timeout fired");
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. At most once per flush
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn duplicates_run_once_per_flush(
        registrations in prop::collection::vec(0usize..6, 0..40),
        phase in phase_strategy(),
    ) {
        let (scheduler, clock, _) = harness();
        let counts = Rc::new(RefCell::new([0usize; 6]));
        let tasks: Vec<Task> = (0..6)
            .map(|slot| {
                let counts = Rc::clone(&counts);
                Task::frame(move || counts.borrow_mut()[slot] += 1)
            })
            .collect();

        for &slot in &registrations {
            scheduler.schedule_in(phase, &tasks[slot]);
        }
        clock.frame();

        for slot in 0..6 {
            let expected = usize::from(registrations.contains(&slot));
            prop_assert_eq!(counts.borrow()[slot], expected, "slot {}", slot);
        }
        prop_assert_eq!(scheduler.pending(phase), 0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Elapsed is clamped
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn elapsed_is_bounded(steps in prop::collection::vec(0.0f64..500.0, 1..30)) {
        let (scheduler, clock, time) = harness();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        scheduler.schedule(&Task::update(move |elapsed| {
            sink.borrow_mut().push(elapsed);
            true
        }));

        clock.frame();
        for step in &steps {
            time.advance(*step);
            clock.frame();
        }

        let seen = seen.borrow();
        prop_assert_eq!(seen.len(), steps.len() + 1);
        prop_assert_eq!(seen[0], 1000.0 / 60.0);
        for (elapsed, step) in seen[1..].iter().zip(&steps) {
            let expected = step.min(64.0);
            prop_assert!(
                (elapsed - expected).abs() < 1e-9,
                "elapsed {} for step {}",
                elapsed,
                step
            );
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Repeat counts
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn repeat_runs_once_per_tick(repeats in 0u32..20, extra_ticks in 1u32..5) {
        let (scheduler, clock, time) = harness();
        let runs = Rc::new(RefCell::new(0u32));
        let counter = Rc::clone(&runs);
        scheduler.schedule(&Task::frame(move || {
            let mut runs = counter.borrow_mut();
            *runs += 1;
            *runs <= repeats
        }));

        for _ in 0..repeats + extra_ticks {
            time.advance(16.0);
            clock.frame();
        }
        prop_assert_eq!(*runs.borrow(), repeats + 1);
        prop_assert!(scheduler.idle(), "task finished");
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Throttle coalescing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn throttle_keeps_last_argument(calls in prop::collection::vec(any::<i32>(), 1..30)) {
        let (scheduler, clock, _) = harness();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let throttled = scheduler.throttle(move |n: i32| sink.borrow_mut().push(n));

        for &n in &calls {
            throttled.call(n);
        }
        clock.frame();
        clock.frame();

        prop_assert_eq!(&*seen.borrow(), &[calls[calls.len() - 1]]);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Clear always resets
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn clear_leaves_idle(
        phases in prop::collection::vec(phase_strategy(), 0..20),
        timeouts in prop::collection::vec(0.0f64..100.0, 0..10),
        ticks_before in 0usize..3,
    ) {
        let (scheduler, clock, _) = harness();
        for phase in &phases {
            scheduler.schedule_in(*phase, &Task::frame(|| true));
        }
        for delay in &timeouts {
            scheduler.set_timeout(|| (), *delay);
        }
        for _ in 0..ticks_before {
            clock.frame();
        }

        scheduler.clear();
        prop_assert!(scheduler.idle(), "idle after clear");
        prop_assert!(!scheduler.is_running(), "stopped after clear");
        for phase in Phase::ALL {
            prop_assert_eq!(scheduler.pending(phase), 0);
        }

        let ticks = scheduler.frame_count();
        clock.frame();
        prop_assert_eq!(scheduler.frame_count(), ticks, "stale frame is inert");
    }
}
