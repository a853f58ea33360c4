//! Time subsystem.
//!
//! Provides elapsed-time measurement decoupled from any platform clock:
//! - one `EpochClock` per frame driver, created at bootstrap
//! - call `tick()` once per frame to obtain `FrameTime`

mod epoch_clock;
#[cfg(not(target_arch = "wasm32"))]
mod monotonic;

pub use epoch_clock::{EpochClock, FrameTime};
#[cfg(not(target_arch = "wasm32"))]
pub use monotonic::{IntervalFrames, MonotonicTime};
