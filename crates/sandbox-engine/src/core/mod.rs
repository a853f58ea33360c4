//! Core engine-facing contracts.
//!
//! This module defines the stable interface between a host loop and the client
//! it drives, plus the configuration shared by every host.

mod client;
mod config;

pub use client::{Client, FrameControl, LoggingClient};
pub use config::{ContextOptions, DriverConfig, FrameErrorPolicy, UpdateArgs};
