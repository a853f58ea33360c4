//! Logging utilities.
//!
//! Native builds initialize `env_logger` here. The browser host installs
//! `console_log` itself; both feed the same `log` facade used by the driver.

#[cfg(not(target_arch = "wasm32"))]
mod init;

#[cfg(not(target_arch = "wasm32"))]
pub use init::{init_logging, LoggingConfig};
