use anyhow::{Context, Result};
use winit::dpi::LogicalSize;

use sandbox_engine::coords::SurfaceSize;
use sandbox_engine::core::{DriverConfig, LoggingClient};
use sandbox_engine::device::GpuInit;
use sandbox_engine::driver::{Bootstrapper, Launched};
use sandbox_engine::host::{HeadlessHost, LogNotifier};
use sandbox_engine::logging::{LoggingConfig, init_logging};
use sandbox_engine::time::{IntervalFrames, MonotonicTime};
use sandbox_engine::window::{Runtime, RuntimeConfig};

/// Truthy values for boolean environment switches.
fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).as_deref(),
        Ok("1") | Ok("true") | Ok("yes") | Ok("on")
    )
}

/// Runs a fixed number of frames against an off-screen host.
fn run_headless(driver_config: DriverConfig, frames: u64) -> Result<()> {
    let bootstrapper = Bootstrapper::new(driver_config);
    let Launched {
        context: mut host,
        mut driver,
    } = bootstrapper.launch(
        |_| Ok(HeadlessHost::new(SurfaceSize::new(800, 600))),
        |_| Ok(LoggingClient::new()),
        MonotonicTime::new(),
        &LogNotifier,
    )?;

    let mut refresh = IntervalFrames::default().limit(frames);
    let driven = driver.run(&mut host, &mut refresh)?;

    let client = driver.client();
    log::info!(
        "headless run finished: {driven} frames, {} updates, {} renders, last update {:?}",
        client.updates(),
        client.renders(),
        client.last_update()
    );
    Ok(())
}

fn run() -> Result<()> {
    let driver_config = DriverConfig::default()
        .alpha_blending(env_flag("SANDBOX_BLEND"))
        .fatal_message("Failed to initialize the GPU");

    let runtime_config = RuntimeConfig {
        title: "Rust Sandbox".to_string(),
        initial_size: LogicalSize::new(800.0, 600.0),
        clear_color: wgpu::Color {
            r: 0.05,
            g: 0.05,
            b: 0.08,
            a: 1.0,
        },
    };

    if let Ok(frames) = std::env::var("SANDBOX_HEADLESS_FRAMES") {
        let frames: u64 = frames
            .parse()
            .with_context(|| format!("invalid SANDBOX_HEADLESS_FRAMES: {frames:?}"))?;
        return run_headless(driver_config, frames);
    }

    log::info!(
        "starting sandbox studio (alpha blending: {})",
        driver_config.enable_alpha_blending
    );

    Runtime::run(runtime_config, GpuInit::default(), driver_config, |gpu| {
        log::info!(
            "client attached: {:?}, {} samples, blending {}",
            gpu.surface_format(),
            gpu.sample_count(),
            if gpu.blend_state().is_some() { "on" } else { "off" },
        );
        Ok(LoggingClient::new())
    })
}

fn main() {
    init_logging(LoggingConfig::default());

    if let Err(e) = run() {
        log::error!("sandbox studio failed: {e:#}");
        std::process::exit(1);
    }
}
