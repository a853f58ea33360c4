use anyhow::{Context, Result, anyhow};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlCanvasElement, WebGlRenderingContext as GL};

use sandbox_engine::coords::ViewportRect;
use sandbox_engine::core::ContextOptions;
use sandbox_engine::host::GraphicsContext;

use crate::error::js_error;

/// WebGL 1 context of a canvas.
pub struct WebGlContext {
    gl: GL,
}

impl WebGlContext {
    /// `canvas.getContext("webgl", { antialias })`.
    pub fn acquire(canvas: &HtmlCanvasElement, options: &ContextOptions) -> Result<Self> {
        let attrs = js_sys::Object::new();
        js_sys::Reflect::set(
            &attrs,
            &JsValue::from_str("antialias"),
            &JsValue::from_bool(options.antialias),
        )
        .map_err(js_error)?;

        let gl = canvas
            .get_context_with_context_options("webgl", &attrs)
            .map_err(js_error)?
            .context("webgl is not supported by this browser")?
            .dyn_into::<GL>()
            .map_err(|_| anyhow!("\"webgl\" context is not a WebGlRenderingContext"))?;

        Ok(Self { gl })
    }

    pub fn raw(&self) -> &GL {
        &self.gl
    }
}

impl GraphicsContext for WebGlContext {
    fn set_viewport(&mut self, viewport: ViewportRect) {
        self.gl.viewport(
            viewport.x,
            viewport.y,
            viewport.width as i32,
            viewport.height as i32,
        );
    }

    fn enable_alpha_blending(&mut self) {
        self.gl.enable(GL::BLEND);
        self.gl.blend_func(GL::SRC_ALPHA, GL::ONE_MINUS_SRC_ALPHA);
    }
}
