//! Sandbox browser host.
//!
//! Drives a client from `requestAnimationFrame` on a page canvas, keeping the
//! canvas sized to the window and the WebGL viewport in sync with it. JS loads
//! the module, then calls `run` (built-in `GameClient`) or `runWithClient`
//! (any object with `update`/`render`).

mod options;

#[cfg(target_arch = "wasm32")]
mod canvas;
#[cfg(target_arch = "wasm32")]
mod client;
#[cfg(target_arch = "wasm32")]
mod clock;
#[cfg(target_arch = "wasm32")]
mod error;
#[cfg(target_arch = "wasm32")]
mod frame_loop;
#[cfg(target_arch = "wasm32")]
mod notify;
#[cfg(target_arch = "wasm32")]
mod webgl;

pub use options::RunOptions;

#[cfg(target_arch = "wasm32")]
pub use client::{GameClient, JsClient};
#[cfg(target_arch = "wasm32")]
pub use frame_loop::LoopHandle;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Runs when the WASM module loads.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
    log::info!("sandbox web host loaded");
}

/// Starts the frame loop on `<canvas id=canvas_id>` with the built-in
/// [`GameClient`].
///
/// Shows an alert and throws if WebGL is unavailable; no frame runs then.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn run(canvas_id: &str, options: Option<RunOptions>) -> Result<LoopHandle, JsValue> {
    launch(canvas_id, options.unwrap_or_default(), || Ok(GameClient::new())).map_err(error::to_js)
}

/// Like [`run`], driving a JS object with `update(t, h, w)` and `render()`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = runWithClient)]
pub fn run_with_client(
    canvas_id: &str,
    client: JsValue,
    options: Option<RunOptions>,
) -> Result<LoopHandle, JsValue> {
    launch(canvas_id, options.unwrap_or_default(), move || JsClient::new(client))
        .map_err(error::to_js)
}

#[cfg(target_arch = "wasm32")]
fn launch<C, F>(canvas_id: &str, options: RunOptions, make_client: F) -> anyhow::Result<LoopHandle>
where
    C: sandbox_engine::core::Client + 'static,
    F: FnOnce() -> anyhow::Result<C>,
{
    use anyhow::Context;
    use sandbox_engine::driver::{Bootstrapper, Launched};

    let window = web_sys::window().context("no global window")?;
    let notifier = notify::AlertNotifier::new(window.clone());

    let Launched { context: host, driver } = Bootstrapper::new(options.to_config()).launch(
        |opts| canvas::WebHost::acquire(&window, canvas_id, opts),
        |_| make_client(),
        clock::PerformanceTime::new(&window),
        &notifier,
    )?;

    Ok(frame_loop::start(window, host, driver))
}
