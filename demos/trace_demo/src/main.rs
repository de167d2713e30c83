// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated frame loop that exercises the tracing and diagnostics pipeline.
//!
//! Pumps a [`Scheduler`] with a [`ManualClock`] at 60 Hz while a small
//! animation, a throttled resize handler, a delayed follow-up, and one broken
//! callback compete for frames. Events go to both a
//! [`PrettyPrintSink`](framewise_debug::pretty::PrettyPrintSink) on stdout and a
//! [`RecorderSink`](framewise_debug::recorder::RecorderSink); the recording is
//! then exported as Chrome trace JSON.
//!
//! Set `RUST_LOG=framewise_core=trace` to also see the scheduler's own logs.

use std::cell::Cell;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use framewise_core::trace::{
    FaultEvent, FrameSummary, PhaseBeginEvent, PhaseEndEvent, TickEvent, TimeoutsEvent, TraceSink,
};
use framewise_core::{Flow, ManualClock, ManualTime, Scheduler, Task};

use framewise_debug::pretty::PrettyPrintSink;
use framewise_debug::recorder::RecorderSink;

/// Upper bound on simulated frames.
const MAX_FRAMES: u64 = 120;
/// 60 Hz refresh interval in milliseconds.
const REFRESH_INTERVAL_MS: f64 = 1000.0 / 60.0;

/// Forwards every event to two sinks.
struct Tee<A, B>(A, B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_tick(&mut self, e: &TickEvent) {
        self.0.on_tick(e);
        self.1.on_tick(e);
    }

    fn on_timeouts(&mut self, e: &TimeoutsEvent) {
        self.0.on_timeouts(e);
        self.1.on_timeouts(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.0.on_phase_begin(e);
        self.1.on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.0.on_phase_end(e);
        self.1.on_phase_end(e);
    }

    fn on_fault(&mut self, e: &FaultEvent) {
        self.0.on_fault(e);
        self.1.on_fault(e);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.0.on_frame_summary(s);
        self.1.on_frame_summary(s);
    }
}

/// Critically damped spring toward `target`; repeats until settled.
fn spring(position: Rc<Cell<f64>>, target: f64) -> Task {
    let mut velocity = 0.0;
    Task::update(move |elapsed_ms| {
        let dt = elapsed_ms / 1000.0;
        let x = position.get();
        let accel = 120.0 * (target - x) - 22.0 * velocity;
        velocity += accel * dt;
        position.set(x + velocity * dt);
        if (target - position.get()).abs() < 0.5 && velocity.abs() < 0.5 {
            position.set(target);
            Flow::Done
        } else {
            Flow::Repeat
        }
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // -- sinks -------------------------------------------------------------
    let pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let recorder = RecorderSink::new();

    // -- scheduler ---------------------------------------------------------
    let scheduler = Scheduler::new();
    let clock = ManualClock::new();
    let time = ManualTime::new(1_000.0);
    scheduler.use_clock(clock.clone());
    scheduler.set_time_source(time.clone());
    scheduler.set_trace_sink(Tee(pretty, recorder.clone()));
    scheduler.set_error_handler(|fault| {
        tracing::warn!(origin = %fault.origin, error = %fault.error, "callback failed");
    });

    // -- workload ----------------------------------------------------------
    let position = Rc::new(Cell::new(0.0));
    let rendered = Rc::new(Cell::new(0.0));

    // Animation: update moves the value, write "renders" it. A finish task
    // keeps re-queueing the render while anything is still in flight.
    let render = {
        let position = Rc::clone(&position);
        let rendered = Rc::clone(&rendered);
        Task::frame(move || rendered.set(position.get()))
    };
    let keep_rendering = {
        let scheduler = scheduler.clone();
        let render = render.clone();
        Task::frame(move || {
            scheduler.write(&render);
            !scheduler.idle()
        })
    };
    scheduler.schedule(&spring(Rc::clone(&position), 100.0));
    scheduler.on_finish(&keep_rendering);

    // A burst of resize events collapses into one handler call per frame.
    let resize = scheduler.throttle(|(width, height): (u32, u32)| {
        tracing::info!(width, height, "resized");
    });
    for step in 0..8 {
        resize.call((800 + step * 10, 600));
    }

    // A second, independent animation starts after 250 ms. Plus one broken
    // callback.
    let offset = Rc::new(Cell::new(0.0));
    let follow_up = {
        let scheduler = scheduler.clone();
        let offset = Rc::clone(&offset);
        move || scheduler.schedule(&spring(offset, 40.0))
    };
    scheduler.set_timeout(follow_up, 250.0);
    scheduler.on_frame(&Task::frame(|| Err::<(), _>("layout measurement failed")));

    // -- simulated loop ----------------------------------------------------
    while !scheduler.idle() && scheduler.frame_count() < MAX_FRAMES {
        time.advance(REFRESH_INTERVAL_MS);
        clock.frame();
    }
    let frames = scheduler.frame_count();
    scheduler.clear();
    tracing::info!(
        frames,
        position = rendered.get(),
        offset = offset.get(),
        "simulation settled"
    );

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    framewise_debug::chrome::export(&recorder.events(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({frames} frames, {} events)", recorder.len());
}
