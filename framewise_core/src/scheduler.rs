// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scheduler handle and its frame loop.
//!
//! A [`Scheduler`] owns five phase queues, the timeout list, and the injected
//! hooks. Registering anything starts the loop: the scheduler asks its
//! [`FrameClock`] for a frame, and every delivered frame re-requests the next
//! one before it ticks. The loop keeps going until [`Scheduler::clear`].
//!
//! A tick samples the [`TimeSource`], runs due timeouts, then flushes
//! `Start`, `Update`, `Frame`, `Write`, and `Finish` in that order, all inside
//! one call of the batched-updates hook.
//!
//! No `RefCell` borrow is held while a user callback, hook, clock, or time
//! source runs, so any of them may call back into the scheduler.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::clock::{FrameClock, NoopClock};
use crate::error::{self, CallbackError, Fault, Origin};
use crate::phase::Phase;
use crate::queue::PhaseQueue;
use crate::task::{Flow, IntoFlow, Task};
use crate::throttle::Throttled;
use crate::time::{self, TimeSource};
use crate::timeout::{TimeoutHandle, TimeoutId, TimeoutList};
use crate::trace::{
    FaultEvent, FrameSummaryBuilder, PhaseBeginEvent, PhaseEndEvent, TickEvent, TimeoutsEvent,
    TraceSink,
};

/// Tunables for the frame loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerConfig {
    /// Upper bound for the elapsed time handed to the update phase.
    pub max_elapsed_ms: f64,
    /// Elapsed time reported on the first tick after the loop (re)starts.
    pub first_frame_elapsed_ms: f64,
}

impl SchedulerConfig {
    /// 64 ms clamp, one 60 Hz frame for the first tick.
    pub const STANDARD: Self = Self {
        max_elapsed_ms: time::MAX_ELAPSED_MS,
        first_frame_elapsed_ms: time::FIRST_FRAME_ELAPSED_MS,
    };
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

type BatchFn = dyn Fn(&mut dyn FnMut());
type ErrorFn = dyn Fn(Fault);

/// Injected collaborators. Cloned out before use so no borrow outlives the
/// lookup.
#[derive(Clone)]
struct Hooks {
    clock: Rc<dyn FrameClock>,
    time: Rc<dyn TimeSource>,
    batched: Rc<BatchFn>,
    on_error: Rc<ErrorFn>,
}

impl Hooks {
    fn new() -> Self {
        Self {
            clock: Rc::new(NoopClock),
            time: default_time_source(),
            batched: Rc::new(run_unbatched),
            on_error: Rc::new(error::log_fault),
        }
    }
}

fn run_unbatched(f: &mut dyn FnMut()) {
    f();
}

#[cfg(all(feature = "std", not(target_arch = "wasm32")))]
fn default_time_source() -> Rc<dyn TimeSource> {
    Rc::new(time::MonotonicTime::new())
}

// No readable clock without std, and `Instant` panics on wasm32. Hosts install
// a source (`framewise_web::install` does).
#[cfg(any(not(feature = "std"), target_arch = "wasm32"))]
fn default_time_source() -> Rc<dyn TimeSource> {
    Rc::new(time::ManualTime::new(0.0))
}

/// Shared scheduler state behind every [`Scheduler`] clone.
pub(crate) struct Inner {
    config: SchedulerConfig,
    queues: RefCell<[PhaseQueue; Phase::COUNT]>,
    timeouts: RefCell<TimeoutList>,
    running: Cell<bool>,
    /// Bumped whenever the loop (re)starts or is cleared. Frame callbacks
    /// carrying an older value are ignored.
    generation: Cell<u64>,
    last_tick: Cell<Option<f64>>,
    frame_count: Cell<u64>,
    sync_depth: Cell<u32>,
    hooks: RefCell<Hooks>,
    tracer: crate::trace::Tracer,
}

impl Inner {
    pub(crate) fn cancel_timeout(&self, id: TimeoutId) -> bool {
        self.timeouts.borrow_mut().cancel(id)
    }

    pub(crate) fn has_timeout(&self, id: TimeoutId) -> bool {
        self.timeouts.borrow().contains(id)
    }
}

struct SyncGuard<'a>(&'a Cell<u32>);

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

/// A cooperative per-frame task scheduler.
///
/// `Scheduler` is a cheap, clonable handle; clones drive the same loop. It is
/// single-threaded (`!Send`) by construction.
///
/// ```
/// use framewise_core::{ManualClock, ManualTime, Scheduler, Task};
///
/// let scheduler = Scheduler::new();
/// let clock = ManualClock::new();
/// let time = ManualTime::new(0.0);
/// scheduler.use_clock(clock.clone());
/// scheduler.set_time_source(time.clone());
///
/// let mut total = 0.0;
/// let step = Task::update(move |elapsed| {
///     total += elapsed;
///     total < 50.0
/// });
/// scheduler.schedule(&step);
///
/// while !scheduler.idle() {
///     time.advance(16.0);
///     clock.frame();
/// }
/// ```
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<Inner>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Creates an idle scheduler with the standard configuration.
    ///
    /// It starts out with a [`NoopClock`], so nothing flushes until a real
    /// clock is installed with [`use_clock`](Self::use_clock).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::STANDARD)
    }

    /// Creates an idle scheduler with custom tunables.
    #[must_use]
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                config,
                queues: RefCell::new(Default::default()),
                timeouts: RefCell::new(TimeoutList::default()),
                running: Cell::new(false),
                generation: Cell::new(0),
                last_tick: Cell::new(None),
                frame_count: Cell::new(0),
                sync_depth: Cell::new(0),
                hooks: RefCell::new(Hooks::new()),
                tracer: crate::trace::Tracer::default(),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<Inner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(inner: &Weak<Inner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    /// The tunables this scheduler was built with.
    #[must_use]
    pub fn config(&self) -> SchedulerConfig {
        self.inner.config
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Queues `task` for the next flush of `phase` and starts the loop.
    ///
    /// Registering a task that is already pending in `phase` is a no-op. A
    /// task registered while its phase is flushing runs on the next flush.
    ///
    /// In sync mode the task runs immediately instead, with `0.0`, and any
    /// pending registration of it in `phase` is dropped.
    pub fn schedule_in(&self, phase: Phase, task: &Task) {
        if self.is_sync() {
            self.inner.queues.borrow_mut()[phase.index()].remove(task);
            if let Err(error) = error::isolate(|| task.run(0.0)) {
                self.report(Origin::Sync(phase), error);
            }
            return;
        }
        let added = self.inner.queues.borrow_mut()[phase.index()].insert(task);
        if added {
            tracing::trace!(%phase, "task scheduled");
        }
        self.start();
    }

    /// Queues an update task. It receives the elapsed milliseconds.
    pub fn schedule(&self, task: &Task) {
        self.schedule_in(Phase::Update, task);
    }

    /// Queues a write task.
    pub fn write(&self, task: &Task) {
        self.schedule_in(Phase::Write, task);
    }

    /// Queues a task for the start of the next frame.
    pub fn on_start(&self, task: &Task) {
        self.schedule_in(Phase::Start, task);
    }

    /// Queues a task that runs between updates and writes.
    pub fn on_frame(&self, task: &Task) {
        self.schedule_in(Phase::Frame, task);
    }

    /// Queues a task for the end of the next frame.
    pub fn on_finish(&self, task: &Task) {
        self.schedule_in(Phase::Finish, task);
    }

    /// Removes a pending registration of `task` from `phase`.
    ///
    /// Returns `false` if it was not pending. A task already taken into the
    /// snapshot of a running flush still runs.
    pub fn cancel(&self, phase: Phase, task: &Task) -> bool {
        self.inner.queues.borrow_mut()[phase.index()].remove(task)
    }

    /// Removes a pending update registration.
    pub fn cancel_update(&self, task: &Task) -> bool {
        self.cancel(Phase::Update, task)
    }

    /// Returns `true` if `task` waits for the next flush of `phase`.
    #[must_use]
    pub fn is_scheduled(&self, phase: Phase, task: &Task) -> bool {
        self.inner.queues.borrow()[phase.index()].contains(task)
    }

    /// Number of tasks waiting for the next flush of `phase`.
    #[must_use]
    pub fn pending(&self, phase: Phase) -> usize {
        self.inner.queues.borrow()[phase.index()].len()
    }

    // -----------------------------------------------------------------------
    // Timeouts
    // -----------------------------------------------------------------------

    /// Runs `handler` once, on the first tick at or after `now() + ms`.
    ///
    /// Timeouts with equal due times fire in registration order. A NaN delay
    /// counts as zero. `handler` may return anything [`IntoFlow`] accepts; a
    /// repeat request is ignored and an `Err` is reported as a fault.
    pub fn set_timeout<F, R>(&self, handler: F, ms: f64) -> TimeoutHandle
    where
        F: FnOnce() -> R + 'static,
        R: IntoFlow,
    {
        let delay = if ms.is_nan() { 0.0 } else { ms };
        let due = self.now() + delay;
        let id = self
            .inner
            .timeouts
            .borrow_mut()
            .insert(due, Box::new(move || handler().into_flow().map(|_| ())));
        tracing::trace!(?id, due, "timeout set");
        self.start();
        TimeoutHandle::new(id, due, Rc::downgrade(&self.inner))
    }

    /// Number of timeouts waiting to fire.
    #[must_use]
    pub fn pending_timeouts(&self) -> usize {
        self.inner.timeouts.borrow().len()
    }

    // -----------------------------------------------------------------------
    // Sync mode and throttling
    // -----------------------------------------------------------------------

    /// Runs `f` in sync mode, inside the batched-updates hook.
    ///
    /// While `f` runs, every registration through this scheduler executes
    /// immediately instead of being queued. Nested calls are fine; sync mode
    /// ends when the outermost call returns, even if `f` panics.
    pub fn sync(&self, f: impl FnOnce()) {
        let depth = &self.inner.sync_depth;
        depth.set(depth.get() + 1);
        let _guard = SyncGuard(depth);
        let batched = Rc::clone(&self.inner.hooks.borrow().batched);
        let mut f = Some(f);
        batched(&mut || {
            if let Some(f) = f.take() {
                f();
            }
        });
    }

    /// Returns `true` while inside [`sync`](Self::sync).
    #[must_use]
    pub fn is_sync(&self) -> bool {
        self.inner.sync_depth.get() > 0
    }

    /// Wraps `f` so that bursts of calls run it at most once per frame, in the
    /// `Start` phase, with the most recent arguments.
    pub fn throttle<A, F, R>(&self, f: F) -> Throttled<A>
    where
        A: 'static,
        F: FnMut(A) -> R + 'static,
        R: IntoFlow,
    {
        Throttled::new(self, f)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Returns `true` when no timeouts and no update tasks are pending.
    ///
    /// The other phases are not consulted.
    #[must_use]
    pub fn idle(&self) -> bool {
        self.inner.timeouts.borrow().is_empty()
            && self.inner.queues.borrow()[Phase::Update.index()].is_empty()
    }

    /// Drops every pending task and timeout and stops the loop.
    ///
    /// A frame callback that is already requested from the clock becomes
    /// inert. The next registration starts a fresh loop.
    pub fn clear(&self) {
        let inner = &self.inner;
        inner.running.set(false);
        inner.generation.set(inner.generation.get().wrapping_add(1));
        inner.last_tick.set(None);
        // Dropped after the borrows end, in case a callback's destructor
        // touches the scheduler.
        let timeouts = inner.timeouts.borrow_mut().clear();
        let tasks: Vec<Vec<Task>> = inner
            .queues
            .borrow_mut()
            .iter_mut()
            .map(PhaseQueue::swap)
            .collect();
        tracing::debug!(
            timeouts = timeouts.len(),
            tasks = tasks.iter().map(Vec::len).sum::<usize>(),
            "scheduler cleared"
        );
        drop(timeouts);
        drop(tasks);
    }

    /// Returns `true` while the frame loop is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Number of ticks run so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.inner.frame_count.get()
    }

    /// Current time from the installed [`TimeSource`], in milliseconds.
    #[must_use]
    pub fn now(&self) -> f64 {
        let time = Rc::clone(&self.inner.hooks.borrow().time);
        time.now()
    }

    // -----------------------------------------------------------------------
    // Hooks
    // -----------------------------------------------------------------------

    /// Installs the frame clock that drives the loop.
    ///
    /// If the loop is running, it moves to the new clock right away; a frame
    /// already requested from the old clock is ignored when it arrives.
    pub fn use_clock(&self, clock: impl FrameClock + 'static) {
        self.inner.hooks.borrow_mut().clock = Rc::new(clock);
        if self.inner.running.get() {
            let generation = self.next_generation();
            tracing::debug!(generation, "frame loop moved to a new clock");
            self.request_frame(generation);
        }
    }

    /// Installs the time source used for ticks and timeout due times.
    ///
    /// The previous tick's timestamp is kept, so the next update still gets
    /// `min(max_elapsed, now - previous)`. A new source should share the old
    /// one's epoch.
    pub fn set_time_source(&self, source: impl TimeSource + 'static) {
        self.inner.hooks.borrow_mut().time = Rc::new(source);
    }

    /// Installs a hook that wraps every tick and every [`sync`](Self::sync)
    /// call, e.g. to batch host-side state updates.
    ///
    /// The hook must call the function it is given exactly once.
    pub fn set_batched_updates(&self, hook: impl Fn(&mut dyn FnMut()) + 'static) {
        self.inner.hooks.borrow_mut().batched = Rc::new(hook);
    }

    /// Installs the handler that receives every contained callback failure.
    ///
    /// The default handler logs through `tracing` at `error` level.
    pub fn set_error_handler(&self, handler: impl Fn(Fault) + 'static) {
        self.inner.hooks.borrow_mut().on_error = Rc::new(handler);
    }

    /// Installs a trace sink, replacing any previous one.
    ///
    /// Without the `trace` feature the sink is dropped and no events are
    /// produced.
    pub fn set_trace_sink(&self, sink: impl TraceSink + 'static) {
        self.inner.tracer.install(Box::new(sink));
    }

    /// Removes and returns the installed trace sink.
    pub fn take_trace_sink(&self) -> Option<Box<dyn TraceSink>> {
        self.inner.tracer.remove()
    }

    // -----------------------------------------------------------------------
    // Loop driver
    // -----------------------------------------------------------------------

    fn next_generation(&self) -> u64 {
        let generation = self.inner.generation.get().wrapping_add(1);
        self.inner.generation.set(generation);
        generation
    }

    /// Starts the loop unless it is already running.
    fn start(&self) {
        if self.inner.running.replace(true) {
            return;
        }
        self.inner.last_tick.set(None);
        let generation = self.next_generation();
        tracing::debug!(generation, "frame loop started");
        self.request_frame(generation);
    }

    fn request_frame(&self, generation: u64) {
        let clock = Rc::clone(&self.inner.hooks.borrow().clock);
        let scheduler = Rc::downgrade(&self.inner);
        clock.request_frame(Box::new(move || {
            if let Some(inner) = scheduler.upgrade() {
                Self { inner }.frame(generation);
            }
        }));
    }

    /// Body of one delivered frame.
    fn frame(&self, generation: u64) {
        if !self.inner.running.get() || self.inner.generation.get() != generation {
            return;
        }
        self.request_frame(generation);
        let batched = Rc::clone(&self.inner.hooks.borrow().batched);
        batched(&mut || self.tick());
    }

    fn tick(&self) {
        let inner = &self.inner;
        let time = Rc::clone(&inner.hooks.borrow().time);
        let now = time.now();
        let elapsed = time::frame_elapsed(
            inner.last_tick.replace(Some(now)),
            now,
            inner.config.max_elapsed_ms,
            inner.config.first_frame_elapsed_ms,
        );
        let frame_index = inner.frame_count.get();
        inner.frame_count.set(frame_index + 1);
        tracing::trace!(frame_index, now, elapsed, "tick");

        let tick = TickEvent {
            frame_index,
            now,
            elapsed,
        };
        inner.tracer.emit(|sink| sink.on_tick(&tick));
        let mut summary = FrameSummaryBuilder::new(&tick);

        let due = inner.timeouts.borrow_mut().take_due(now);
        let fired = due.len();
        let mut failed = 0;
        for entry in due {
            if let Err(error) = error::isolate(entry.handler) {
                failed += 1;
                self.report(Origin::Timeout, error);
            }
        }
        if fired > 0 {
            let remaining = inner.timeouts.borrow().len();
            inner.tracer.emit(|sink| {
                sink.on_timeouts(&TimeoutsEvent {
                    frame_index,
                    fired,
                    remaining,
                });
            });
        }
        summary.timeouts(fired, failed);

        for phase in Phase::ALL {
            let arg = if phase == Phase::Update { elapsed } else { 0.0 };
            if let Some(end) = self.flush(phase, arg, frame_index, &*time) {
                summary.phase_end(&end);
            }
        }

        let summary = summary.finish(time.now());
        inner.tracer.emit(|sink| sink.on_frame_summary(&summary));
    }

    /// Runs one phase's snapshot. Returns `None` if the phase was empty.
    fn flush(
        &self,
        phase: Phase,
        arg: f64,
        frame_index: u64,
        time: &dyn TimeSource,
    ) -> Option<PhaseEndEvent> {
        let snapshot = {
            let mut queues = self.inner.queues.borrow_mut();
            let queue = &mut queues[phase.index()];
            if queue.is_empty() {
                return None;
            }
            queue.swap()
        };
        self.inner.tracer.emit(|sink| {
            sink.on_phase_begin(&PhaseBeginEvent {
                frame_index,
                phase,
                timestamp: time.now(),
                pending: snapshot.len(),
            });
        });

        let mut end = PhaseEndEvent {
            frame_index,
            phase,
            ..PhaseEndEvent::default()
        };
        for task in &snapshot {
            end.ran += 1;
            match error::isolate(|| task.run(arg)) {
                Ok(Flow::Repeat) => {
                    end.repeated += 1;
                    self.inner.queues.borrow_mut()[phase.index()].insert(task);
                }
                Ok(Flow::Done) => {}
                Err(error) => {
                    end.failed += 1;
                    self.report(Origin::Phase(phase), error);
                }
            }
        }

        self.inner.tracer.emit(|sink| {
            sink.on_phase_end(&PhaseEndEvent {
                timestamp: time.now(),
                ..end
            });
        });
        Some(end)
    }

    fn report(&self, origin: Origin, error: CallbackError) {
        let frame_index = self.inner.frame_count.get().saturating_sub(1);
        self.inner
            .tracer
            .emit(|sink| sink.on_fault(&FaultEvent { frame_index, origin }));
        let on_error = Rc::clone(&self.inner.hooks.borrow().on_error);
        on_error(Fault { origin, error });
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending: [usize; Phase::COUNT] = Phase::ALL.map(|phase| self.pending(phase));
        f.debug_struct("Scheduler")
            .field("running", &self.is_running())
            .field("frame_count", &self.frame_count())
            .field("pending", &pending)
            .field("timeouts", &self.pending_timeouts())
            .field("sync", &self.is_sync())
            .finish_non_exhaustive()
    }
}
