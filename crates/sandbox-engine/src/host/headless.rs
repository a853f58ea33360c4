use anyhow::Result;

use crate::coords::{SurfaceSize, ViewportRect};

use super::{GraphicsContext, Surface};

/// Off-screen host with a settable "window" size.
///
/// Used for runs without a window system; it records what the driver
/// configured instead of talking to a GPU.
#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    live: SurfaceSize,
    applied: SurfaceSize,
    viewport: ViewportRect,
    alpha_blending: bool,
    resizes: u64,
}

impl HeadlessHost {
    pub fn new(live: SurfaceSize) -> Self {
        Self {
            live,
            ..Self::default()
        }
    }

    /// Simulates the environment viewport changing size.
    pub fn set_live_size(&mut self, size: SurfaceSize) {
        self.live = size;
    }

    pub fn viewport(&self) -> ViewportRect {
        self.viewport
    }

    pub fn alpha_blending(&self) -> bool {
        self.alpha_blending
    }

    /// Number of times the surface was resized.
    pub fn resizes(&self) -> u64 {
        self.resizes
    }
}

impl Surface for HeadlessHost {
    fn live_size(&self) -> SurfaceSize {
        self.live
    }

    fn applied_size(&self) -> SurfaceSize {
        self.applied
    }

    fn apply_size(&mut self, size: SurfaceSize) -> Result<()> {
        self.applied = size;
        self.resizes += 1;
        Ok(())
    }
}

impl GraphicsContext for HeadlessHost {
    fn set_viewport(&mut self, viewport: ViewportRect) {
        self.viewport = viewport;
    }

    fn enable_alpha_blending(&mut self) {
        self.alpha_blending = true;
    }
}
