use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Window;

use sandbox_engine::core::{Client, FrameControl};
use sandbox_engine::driver::{FrameDriver, StopHandle};
use sandbox_engine::host::FrameScheduler;

use crate::canvas::WebHost;
use crate::clock::PerformanceTime;
use crate::error::js_error;

type FrameCallback = Closure<dyn FnMut(f64)>;

/// `requestAnimationFrame` as a [`FrameScheduler`].
///
/// Owns the callback. The callback owns the loop state, so the pair forms a
/// cycle until [`RafScheduler::release`] hands the callback out of here.
struct RafScheduler {
    window: Window,
    callback: Option<FrameCallback>,
    pending: Option<i32>,
}

impl RafScheduler {
    fn release(&mut self) -> Option<FrameCallback> {
        self.cancel_frame();
        self.callback.take()
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> Result<()> {
        let cb = self
            .callback
            .as_ref()
            .context("animation loop already released")?;
        let id = self
            .window
            .request_animation_frame(cb.as_ref().unchecked_ref())
            .map_err(js_error)
            .context("requestAnimationFrame failed")?;
        self.pending = Some(id);
        Ok(())
    }

    fn cancel_frame(&mut self) {
        if let Some(id) = self.pending.take() {
            if let Err(e) = self.window.cancel_animation_frame(id) {
                log::warn!("cancelAnimationFrame failed: {e:?}");
            }
        }
    }
}

/// Drops the callback once the current JS task has finished, so a callback
/// that ends its own loop is never freed while it is running.
fn release_later(callback: FrameCallback) {
    wasm_bindgen_futures::spawn_local(async move {
        drop(callback);
    });
}

/// Loop state shared between the rAF callback and the JS-side handle.
struct LoopState<C> {
    host: WebHost,
    driver: FrameDriver<C, PerformanceTime>,
    scheduler: RafScheduler,
}

impl<C: Client> LoopState<C> {
    /// One refresh signal. Returns the callback once the loop has ended.
    fn tick(&mut self) -> Option<FrameCallback> {
        // The signal that got us here has fired.
        self.scheduler.pending = None;

        match self.driver.scheduled_frame(&mut self.host, &mut self.scheduler) {
            Ok(FrameControl::Continue) => None,
            // A halting error was already logged by the driver.
            Ok(FrameControl::Stop) | Err(_) => {
                log::info!("animation loop stopped after {} frames", self.driver.frames());
                self.scheduler.release()
            }
        }
    }
}

/// Type-erased view of a running loop, held by [`LoopHandle`].
trait LoopControl {
    fn halt(&mut self) -> Option<FrameCallback>;
    fn frames(&self) -> u64;
}

impl<C: Client> LoopControl for LoopState<C> {
    fn halt(&mut self) -> Option<FrameCallback> {
        self.scheduler.release()
    }

    fn frames(&self) -> u64 {
        self.driver.frames()
    }
}

/// Starts the loop: runs the first frame immediately, then one per
/// `requestAnimationFrame`. The loop keeps itself alive until it stops.
pub(crate) fn start<C: Client + 'static>(
    window: Window,
    host: WebHost,
    driver: FrameDriver<C, PerformanceTime>,
) -> LoopHandle {
    let stop = driver.stop_handle();
    let state = Rc::new(RefCell::new(LoopState {
        host,
        driver,
        scheduler: RafScheduler {
            window,
            callback: None,
            pending: None,
        },
    }));

    let ticker = state.clone();
    let callback = Closure::<dyn FnMut(f64)>::new(move |_timestamp: f64| {
        let finished = ticker.borrow_mut().tick();
        if let Some(callback) = finished {
            release_later(callback);
        }
    });
    state.borrow_mut().scheduler.callback = Some(callback);

    // Not inside the callback, so an immediate drop is fine.
    let finished = state.borrow_mut().tick();
    drop(finished);

    LoopHandle { stop, state }
}

/// JS-side control of a running animation loop.
#[wasm_bindgen]
pub struct LoopHandle {
    stop: StopHandle,
    state: Rc<RefCell<dyn LoopControl>>,
}

#[wasm_bindgen]
impl LoopHandle {
    /// Stops the loop. No further `update`/`render` calls are made.
    pub fn stop(&self) {
        self.stop.stop();
        // Called from inside a frame (e.g. by a JS client): the tick sees the
        // cleared flag and releases the loop on its own.
        let released = match self.state.try_borrow_mut() {
            Ok(mut state) => state.halt(),
            Err(_) => None,
        };
        if let Some(callback) = released {
            release_later(callback);
        }
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.stop.is_running()
    }

    /// Frames started so far.
    pub fn frames(&self) -> f64 {
        self.state.try_borrow().map(|s| s.frames()).unwrap_or(0) as f64
    }
}
