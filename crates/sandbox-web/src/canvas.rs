use anyhow::{Context, Result, anyhow};
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, Window};

use sandbox_engine::coords::{SurfaceSize, ViewportRect};
use sandbox_engine::core::ContextOptions;
use sandbox_engine::host::{GraphicsContext, Surface};

use crate::error::js_error;
use crate::webgl::WebGlContext;

/// A page canvas that tracks the window's inner size.
pub struct CanvasSurface {
    window: Window,
    canvas: HtmlCanvasElement,
}

impl CanvasSurface {
    pub fn new(window: Window, canvas: HtmlCanvasElement) -> Self {
        Self { window, canvas }
    }

    /// Looks up `<canvas id=canvas_id>` in the window's document.
    pub fn find(window: &Window, canvas_id: &str) -> Result<Self> {
        let document = window.document().context("window has no document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .with_context(|| format!("canvas #{canvas_id} not found"))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| anyhow!("element #{canvas_id} is not a canvas"))?;
        Ok(Self::new(window.clone(), canvas))
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl Surface for CanvasSurface {
    fn live_size(&self) -> SurfaceSize {
        let w = self.window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let h = self.window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        SurfaceSize::new(w.max(0.0) as u32, h.max(0.0) as u32)
    }

    fn applied_size(&self) -> SurfaceSize {
        SurfaceSize::new(self.canvas.width(), self.canvas.height())
    }

    fn apply_size(&mut self, size: SurfaceSize) -> Result<()> {
        // Backing store and CSS size stay equal; no devicePixelRatio scaling.
        self.canvas.set_height(size.height);
        self.canvas.set_width(size.width);

        let style = self.canvas.style();
        style
            .set_property("height", &format!("{}px", size.height))
            .map_err(js_error)?;
        style
            .set_property("width", &format!("{}px", size.width))
            .map_err(js_error)?;
        Ok(())
    }
}

/// Canvas plus its WebGL context: everything a frame needs from the page.
pub struct WebHost {
    pub surface: CanvasSurface,
    pub gl: WebGlContext,
}

impl WebHost {
    /// Finds the canvas and acquires its WebGL context. Any failure here is
    /// reported as an unavailable context.
    pub fn acquire(window: &Window, canvas_id: &str, options: &ContextOptions) -> Result<Self> {
        let surface = CanvasSurface::find(window, canvas_id)?;
        let gl = WebGlContext::acquire(surface.canvas(), options)?;
        Ok(Self { surface, gl })
    }
}

impl Surface for WebHost {
    fn live_size(&self) -> SurfaceSize {
        self.surface.live_size()
    }

    fn applied_size(&self) -> SurfaceSize {
        self.surface.applied_size()
    }

    fn apply_size(&mut self, size: SurfaceSize) -> Result<()> {
        self.surface.apply_size(size)
    }
}

impl GraphicsContext for WebHost {
    fn set_viewport(&mut self, viewport: ViewportRect) {
        self.gl.set_viewport(viewport);
    }

    fn enable_alpha_blending(&mut self) {
        self.gl.enable_alpha_blending();
    }
}
