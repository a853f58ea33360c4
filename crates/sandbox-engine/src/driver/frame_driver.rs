use anyhow::{Context, Result};

use crate::coords::{SurfaceSize, ViewportRect};
use crate::core::{Client, DriverConfig, FrameControl, FrameErrorPolicy, UpdateArgs};
use crate::host::{FrameScheduler, FrameSource, Host, TimeSource};
use crate::time::{EpochClock, FrameTime};

use super::StopHandle;

/// What a completed frame did.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameReport {
    pub time: FrameTime,
    /// Live viewport size the frame ran at.
    pub size: SurfaceSize,
    /// Whether the surface and viewport were updated this frame.
    pub resized: bool,
}

/// Per-frame loop body: resize check, `update`, `render`.
///
/// Owns the client and the epoch clock. The host owns scheduling: it requests
/// the next refresh signal first and then calls [`FrameDriver::frame`] (or
/// [`FrameDriver::step`]), so a failing frame cannot unschedule the loop.
pub struct FrameDriver<C, T> {
    client: C,
    clock: EpochClock<T>,
    update_args: UpdateArgs,
    on_error: FrameErrorPolicy,
    stop: StopHandle,
}

impl<C: Client, T: TimeSource> FrameDriver<C, T> {
    pub fn new(client: C, clock: EpochClock<T>, config: &DriverConfig) -> Self {
        Self {
            client,
            clock,
            update_args: config.update_args,
            on_error: config.on_frame_error,
            stop: StopHandle::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.stop.is_running()
    }

    /// Number of frames started so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.clock.frames()
    }

    /// Runs one frame. Returns `Ok(None)` without touching the client once
    /// the driver has been stopped.
    pub fn step<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<Option<FrameReport>> {
        if !self.stop.is_running() {
            return Ok(None);
        }

        let time = self.clock.tick();

        let live = host.live_size();
        let resized = live != host.applied_size();
        if resized {
            host.apply_size(live)
                .with_context(|| format!("failed to resize surface to {live}"))?;
            host.set_viewport(ViewportRect::covering(live));
            log::debug!("surface resized to {live}");
        }

        let (height, width) = self.update_args.resolve(live);
        self.client
            .update(time.elapsed_ms, height, width)
            .context("client update failed")?;
        self.client.render().context("client render failed")?;

        log::trace!("frame {} at {:.1}ms", time.frame_index, time.elapsed_ms);

        Ok(Some(FrameReport {
            time,
            size: live,
            resized,
        }))
    }

    /// Runs one frame and applies the configured error policy.
    ///
    /// Under `Continue` a failed frame is logged and swallowed. Under `Halt`
    /// the driver stops and the error is returned.
    pub fn frame<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<FrameControl> {
        match self.step(host) {
            Ok(Some(_)) => Ok(FrameControl::Continue),
            Ok(None) => Ok(FrameControl::Stop),
            Err(err) => match self.on_error {
                FrameErrorPolicy::Continue => {
                    log::error!("frame {} failed: {err:#}", self.frames().saturating_sub(1));
                    Ok(FrameControl::Continue)
                }
                FrameErrorPolicy::Halt => {
                    log::error!("frame {} failed, halting: {err:#}", self.frames().saturating_sub(1));
                    self.stop.stop();
                    Err(err)
                }
            },
        }
    }

    /// Handles one refresh signal of a callback-driven host.
    ///
    /// The next signal is requested before the frame runs, so a failing
    /// frame under `Continue` leaves the loop scheduled. When the driver is
    /// stopped (beforehand, by the frame itself or by its error policy) the
    /// pending request is cancelled and `Stop` is returned. A `Halt` error is
    /// returned after cancelling.
    pub fn scheduled_frame<H, S>(&mut self, host: &mut H, scheduler: &mut S) -> Result<FrameControl>
    where
        H: Host + ?Sized,
        S: FrameScheduler + ?Sized,
    {
        if !self.is_running() {
            scheduler.cancel_frame();
            return Ok(FrameControl::Stop);
        }

        if let Err(err) = scheduler.request_frame() {
            log::error!("failed to schedule the next frame: {err:#}");
        }

        let control = match self.frame(host) {
            Ok(control) => control,
            Err(err) => {
                scheduler.cancel_frame();
                return Err(err);
            }
        };

        if control == FrameControl::Stop || !self.is_running() {
            scheduler.cancel_frame();
            return Ok(FrameControl::Stop);
        }

        Ok(FrameControl::Continue)
    }

    /// Drives frames from a blocking refresh source until the driver is
    /// stopped or the source is exhausted. Returns the number of frames run.
    pub fn run<H, S>(&mut self, host: &mut H, frames: &mut S) -> Result<u64>
    where
        H: Host + ?Sized,
        S: FrameSource + ?Sized,
    {
        let mut driven = 0;

        while self.is_running() && frames.wait_for_frame() {
            match self.frame(host)? {
                FrameControl::Continue => driven += 1,
                FrameControl::Stop => break,
            }
        }

        log::debug!("frame loop ended after {driven} frames");
        Ok(driven)
    }
}
