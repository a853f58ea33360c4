//! Capabilities the frame driver borrows from its environment.
//!
//! The driver never talks to a window system, DOM, or GPU API directly. Each
//! host (browser canvas, native window, test double) implements these traits
//! and the driver stays polymorphic over them.

mod headless;
mod notify;

use anyhow::Result;

use crate::coords::{SurfaceSize, ViewportRect};

pub use headless::HeadlessHost;
pub use notify::{LogNotifier, StreamNotifier};

/// The drawing surface and the environment viewport it should track.
pub trait Surface {
    /// Current size of the environment viewport (window inner size).
    fn live_size(&self) -> SurfaceSize;

    /// Size most recently written to the surface.
    fn applied_size(&self) -> SurfaceSize;

    /// Sets both backing-store size and layout size to `size`.
    fn apply_size(&mut self, size: SurfaceSize) -> Result<()>;
}

/// State the driver configures on the graphics context.
pub trait GraphicsContext {
    /// Maps drawing coordinates onto `viewport`.
    fn set_viewport(&mut self, viewport: ViewportRect);

    /// Enables standard source-over alpha compositing:
    /// `src * src_alpha + dst * (1 - src_alpha)`.
    fn enable_alpha_blending(&mut self);
}

/// A host that offers both a surface and a context to draw into it.
pub trait Host: Surface + GraphicsContext {}

impl<T: Surface + GraphicsContext + ?Sized> Host for T {}

/// Blocking, user-visible notification for unrecoverable startup failures.
pub trait Notifier {
    fn fatal(&self, message: &str);
}

/// Wall or monotonic clock, in milliseconds.
pub trait TimeSource {
    fn now_ms(&self) -> f64;
}

/// Display refresh signal for hosts that can block until the next frame.
pub trait FrameSource {
    /// Blocks until the next refresh. Returns `false` once the source is exhausted.
    fn wait_for_frame(&mut self) -> bool;
}

/// Callback-driven refresh signal (`requestAnimationFrame`, redraw requests).
///
/// Unlike [`FrameSource`] nothing blocks: the host asks for the next signal
/// and is called back later.
pub trait FrameScheduler {
    /// Registers interest in the next refresh signal.
    fn request_frame(&mut self) -> Result<()>;

    /// Withdraws a pending request, if any. Called once when the loop ends.
    fn cancel_frame(&mut self);
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn fatal(&self, message: &str) {
        (**self).fatal(message)
    }
}
