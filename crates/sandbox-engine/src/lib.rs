//! Sandbox engine crate.
//!
//! Owns the host-agnostic frame driver (bootstrap, per-frame resize/update/
//! render sequencing) and the native winit + wgpu host. The browser host lives
//! in `sandbox-web`.

pub mod core;
pub mod coords;
pub mod driver;
pub mod host;
pub mod logging;
pub mod time;

#[cfg(not(target_arch = "wasm32"))]
pub mod device;
#[cfg(not(target_arch = "wasm32"))]
pub mod window;
