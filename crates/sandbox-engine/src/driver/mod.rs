//! Bootstrapper and frame driver.
//!
//! `Bootstrapper::launch` runs once: it acquires the graphics context (or
//! reports a fatal error), applies one-time context state, constructs the
//! client and captures the epoch. The returned `FrameDriver` then runs one
//! frame per refresh signal until stopped.

mod bootstrap;
mod frame_driver;
mod stop;

#[cfg(test)]
mod tests;

pub use bootstrap::{Bootstrapper, Launched};
pub use frame_driver::{FrameDriver, FrameReport};
pub use stop::StopHandle;
