// Copyright 2026 the Framewise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` frame clock and browser time sources.
//!
//! [`RafClock`] hands each scheduler frame callback to the browser's
//! `requestAnimationFrame`. The [`DOMHighResTimeStamp`][mdn] the browser
//! passes along is ignored: the scheduler samples its own [`TimeSource`],
//! normally [`PerformanceTime`], which reads the same clock.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use framewise_core::clock::{FrameCallback, FrameClock};
use framewise_core::time::TimeSource;

// Direct global bindings instead of `web_sys::Window` methods; avoids
// fetching (and unwrapping) the Window/Performance objects on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    fn performance_now() -> f64;

    #[wasm_bindgen(js_namespace = Date, js_name = "now")]
    fn date_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;
}

/// A [`FrameClock`] backed by `window.requestAnimationFrame`.
///
/// Only use it where a `window` exists; [`install`](crate::install) checks
/// that for you.
#[derive(Clone, Copy, Debug, Default)]
pub struct RafClock;

impl FrameClock for RafClock {
    fn request_frame(&self, callback: FrameCallback) {
        // The JS function frees itself after its single invocation.
        let closure = Closure::once_into_js(move |_timestamp_ms: f64| callback());
        request_animation_frame(&closure);
    }
}

/// `performance.now()`: high-resolution milliseconds since page load.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerformanceTime;

impl TimeSource for PerformanceTime {
    fn now(&self) -> f64 {
        performance_now()
    }
}

/// `Date.now()`: wall-clock milliseconds, for hosts without `performance`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DateTime;

impl TimeSource for DateTime {
    fn now(&self) -> f64 {
        date_now()
    }
}
