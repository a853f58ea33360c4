//! Size and viewport types shared by the driver and every host.
//!
//! All values are in surface pixels, origin top-left. Backing store and layout
//! size are kept equal, so there is no separate device-pixel-ratio scale.

mod size;
mod viewport;

pub use size::SurfaceSize;
pub use viewport::ViewportRect;
