use anyhow::{Context, Result, anyhow};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::coords::{SurfaceSize, ViewportRect};
use crate::core::{Client, DriverConfig, FrameControl};
use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::driver::{Bootstrapper, FrameDriver, Launched};
use crate::host::{FrameScheduler, GraphicsContext, StreamNotifier, Surface};
use crate::time::MonotonicTime;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Color the frame is cleared to before it is presented.
    pub clear_color: wgpu::Color,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "sandbox".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            clear_color: wgpu::Color::BLACK,
        }
    }
}

/// Native host: one winit window driven by a `FrameDriver`.
pub struct Runtime;

impl Runtime {
    /// Opens the window, bootstraps the driver against it and runs frames
    /// until the window is closed or the driver stops.
    ///
    /// `make_client` is called once with the configured GPU context, so a
    /// client can create its pipelines from `device()`, `surface_format()`,
    /// `sample_count()` and `blend_state()`. If the GPU cannot be acquired the
    /// fatal message is printed to stderr (there is no modal dialog) and the
    /// error is returned. A halted frame also ends the loop and is returned.
    pub fn run<C, F>(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        driver_config: DriverConfig,
        make_client: F,
    ) -> Result<()>
    where
        C: Client + 'static,
        F: FnOnce(&Gpu<'_>) -> Result<C> + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, driver_config, make_client);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// The surface half of the native host, borrowed for one frame.
struct NativeHost<'a, 'w> {
    window: &'a Window,
    gpu: &'a mut Gpu<'w>,
}

impl Surface for NativeHost<'_, '_> {
    fn live_size(&self) -> SurfaceSize {
        let size = self.window.inner_size();
        SurfaceSize::new(size.width, size.height)
    }

    fn applied_size(&self) -> SurfaceSize {
        let size = self.gpu.size();
        SurfaceSize::new(size.width, size.height)
    }

    fn apply_size(&mut self, size: SurfaceSize) -> Result<()> {
        self.gpu.resize(PhysicalSize::new(size.width, size.height));
        Ok(())
    }
}

impl GraphicsContext for NativeHost<'_, '_> {
    fn set_viewport(&mut self, viewport: ViewportRect) {
        self.gpu.set_viewport(viewport);
    }

    fn enable_alpha_blending(&mut self) {
        self.gpu.enable_alpha_blending();
    }
}

/// Redraw requests stand in for the display refresh signal.
struct RedrawScheduler<'a> {
    window: &'a Window,
}

impl FrameScheduler for RedrawScheduler<'_> {
    fn request_frame(&mut self) -> Result<()> {
        self.window.request_redraw();
        Ok(())
    }

    // winit has no way to withdraw a request; a stopped driver ignores it.
    fn cancel_frame(&mut self) {}
}

struct Session<'w, C> {
    gpu: Gpu<'w>,
    driver: FrameDriver<C, MonotonicTime>,
}

#[self_referencing]
struct WindowEntry<C: 'static> {
    window: Window,

    #[borrows(window)]
    #[covariant]
    session: Session<'this, C>,
}

struct AppState<C, F>
where
    C: Client + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    driver_config: DriverConfig,
    make_client: Option<F>,

    entry: Option<WindowEntry<C>>,
    failure: Option<anyhow::Error>,
}

impl<C, F> AppState<C, F>
where
    C: Client + 'static,
    F: FnOnce(&Gpu<'_>) -> Result<C>,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, driver_config: DriverConfig, make_client: F) -> Self {
        Self {
            config,
            gpu_init,
            driver_config,
            make_client: Some(make_client),
            entry: None,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.failure.get_or_insert(err);
        self.shutdown(event_loop);
    }

    /// Explicit teardown: stop the driver, drop GPU + window, leave the loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(entry) = self.entry.take() {
            entry.with_session(|s| s.driver.stop_handle().stop());
        }
        event_loop.exit();
    }

    fn bootstrap(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let make_client = self
            .make_client
            .take()
            .ok_or_else(|| anyhow!("runtime was already bootstrapped"))?;

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let bootstrapper = Bootstrapper::new(self.driver_config.clone());

        let entry = WindowEntryTryBuilder {
            window,
            session_builder: |w| {
                bootstrapper
                    .launch(
                        |opts| pollster::block_on(Gpu::new(w, gpu_init, opts)),
                        make_client,
                        MonotonicTime::new(),
                        &StreamNotifier::stderr(),
                    )
                    .map(|Launched { context, driver }| Session { gpu: context, driver })
            },
        }
        .try_build()?;

        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
        Ok(())
    }

    /// One refresh: schedule the next one, run the frame, present.
    fn redraw(&mut self) -> Result<FrameControl> {
        let Some(entry) = self.entry.as_mut() else {
            return Ok(FrameControl::Stop);
        };

        let clear = self.config.clear_color;
        entry.with_mut(|fields| -> Result<FrameControl> {
            let session = fields.session;
            let mut scheduler = RedrawScheduler {
                window: fields.window,
            };
            let mut host = NativeHost {
                window: fields.window,
                gpu: &mut session.gpu,
            };

            let control = session.driver.scheduled_frame(&mut host, &mut scheduler)?;
            if control == FrameControl::Stop {
                return Ok(FrameControl::Stop);
            }

            fields.window.pre_present_notify();
            match session.gpu.present_clear(clear) {
                Err(SurfaceErrorAction::Fatal) => Err(anyhow!("surface lost: out of memory")),
                Ok(()) | Err(_) => Ok(FrameControl::Continue),
            }
        })
    }
}

impl<C, F> ApplicationHandler for AppState<C, F>
where
    C: Client + 'static,
    F: FnOnce(&Gpu<'_>) -> Result<C>,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.failure.is_some() {
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        if let Err(e) = self.bootstrap(event_loop) {
            self.fail(event_loop, e.context("startup failed"));
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(entry) = self.entry.as_ref() else {
            return;
        };
        if entry.with_window(|w| w.id()) != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                log::info!("window closed");
                self.shutdown(event_loop);
            }

            // Size changes are picked up by the next frame's resize check.
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::RedrawRequested => match self.redraw() {
                Ok(FrameControl::Continue) => {}
                Ok(FrameControl::Stop) => self.shutdown(event_loop),
                Err(e) => self.fail(event_loop, e),
            },

            _ => {}
        }
    }
}
