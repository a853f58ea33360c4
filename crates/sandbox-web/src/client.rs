use anyhow::{Context, Result, anyhow};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use sandbox_engine::core::{Client, LoggingClient};

use crate::error::js_error;

/// The sandbox game client exported to JavaScript.
///
/// Usable directly from JS (`new GameClient()`, `update`, `render`) or driven
/// by [`crate::run`].
#[wasm_bindgen]
#[derive(Default)]
pub struct GameClient {
    inner: LoggingClient,
}

#[wasm_bindgen]
impl GameClient {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, time: f64, height: f64, width: f64) -> Result<(), JsValue> {
        self.inner
            .update(time, height, width)
            .map_err(|e| JsValue::from_str(&format!("{e:#}")))
    }

    pub fn render(&mut self) {
        if let Err(e) = self.inner.render() {
            log::error!("render failed: {e:#}");
        }
    }

    /// Number of frames rendered so far.
    pub fn frames(&self) -> f64 {
        self.inner.renders() as f64
    }
}

impl Client for GameClient {
    fn update(&mut self, elapsed_ms: f64, height: f64, width: f64) -> Result<()> {
        self.inner.update(elapsed_ms, height, width)
    }

    fn render(&mut self) -> Result<()> {
        self.inner.render()
    }
}

/// Any JavaScript object with `update(t, h, w)` and `render()` methods.
///
/// The methods are looked up once, when the client is wrapped. An exception
/// thrown by either becomes the frame's error.
pub struct JsClient {
    this: JsValue,
    update: js_sys::Function,
    render: js_sys::Function,
}

impl JsClient {
    pub fn new(this: JsValue) -> Result<Self> {
        anyhow::ensure!(this.is_object(), "client must be an object");
        let update = method(&this, "update")?;
        let render = method(&this, "render")?;
        Ok(Self { this, update, render })
    }
}

fn method(this: &JsValue, name: &str) -> Result<js_sys::Function> {
    js_sys::Reflect::get(this, &JsValue::from_str(name))
        .map_err(js_error)?
        .dyn_into::<js_sys::Function>()
        .map_err(|_| anyhow!("client has no `{name}` method"))
}

impl Client for JsClient {
    fn update(&mut self, elapsed_ms: f64, height: f64, width: f64) -> Result<()> {
        self.update
            .call3(
                &self.this,
                &JsValue::from_f64(elapsed_ms),
                &JsValue::from_f64(height),
                &JsValue::from_f64(width),
            )
            .map_err(js_error)
            .context("update threw")?;
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        self.render
            .call0(&self.this)
            .map_err(js_error)
            .context("render threw")?;
        Ok(())
    }
}
