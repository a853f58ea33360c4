use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::coords::{SurfaceSize, ViewportRect};
use crate::core::ContextOptions;
use crate::host::GraphicsContext;

/// Initialization parameters for the GPU layer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    ///
    /// FIFO waits for vertical blank, which is what paces the frame loop.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}

/// Native graphics context: wgpu device + window surface.
///
/// This is the desktop counterpart of a canvas WebGL context. Surface
/// configuration plays the role of the canvas backing store, and the stored
/// viewport and blend state are what clients draw with.
pub struct Gpu<'w> {
    /// Surface bound to the window.
    ///
    /// Surface lifetime is tied to the window; the window must outlive `Gpu`.
    surface: wgpu::Surface<'w>,

    device: wgpu::Device,
    queue: wgpu::Queue,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,

    /// Last size written to the surface, in physical pixels. May be zero while
    /// the window is minimized; configuration is deferred in that case.
    size: PhysicalSize<u32>,

    viewport: ViewportRect,
    blend: Option<wgpu::BlendState>,
    sample_count: u32,

    /// Multisampled color target resolved into the surface texture. Present
    /// only when `sample_count > 1`.
    msaa: Option<wgpu::TextureView>,
}

/// Represents a single acquired frame.
///
/// This object is short-lived and must be finalized promptly. Holding the surface
/// texture prevents acquisition of subsequent frames.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

impl<'w> Gpu<'w> {
    /// Creates a GPU context bound to a window.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: &'w Window, init: GpuInit, options: &ContextOptions) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sandbox device"),
                required_features: wgpu::Features::empty(),
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&surface_caps, init.prefer_srgb)
            .context("no supported surface formats")?;

        let alpha_mode = init
            .alpha_mode
            .filter(|m| surface_caps.alpha_modes.contains(m))
            .unwrap_or_else(|| {
                surface_caps
                    .alpha_modes
                    .first()
                    .copied()
                    .unwrap_or(wgpu::CompositeAlphaMode::Auto)
            });

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        surface.configure(&device, &config);

        let sample_count = pick_sample_count(options.antialias, |count| {
            adapter
                .get_texture_format_features(format)
                .flags
                .sample_count_supported(count)
        });
        let msaa = create_msaa_target(&device, &config, sample_count);

        log::info!(
            "gpu ready: {} ({:?}), surface {:?} {}x{}, {}x msaa",
            adapter.get_info().name,
            adapter.get_info().backend,
            format,
            size.width,
            size.height,
            sample_count,
        );

        Ok(Gpu {
            surface,
            device,
            queue,
            config,
            size,
            viewport: ViewportRect::covering(SurfaceSize::new(size.width, size.height)),
            blend: None,
            sample_count,
            msaa,
        })
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Returns the last size written to the surface (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Viewport clients should draw into.
    pub fn viewport(&self) -> ViewportRect {
        self.viewport
    }

    /// Blend state for client pipelines; `Some` once alpha blending is enabled.
    pub fn blend_state(&self) -> Option<wgpu::BlendState> {
        self.blend
    }

    /// MSAA sample count of the frame's color target; pipelines drawing into
    /// the frame must use the same count.
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Reconfigures the surface after a resize.
    ///
    /// wgpu does not support configuring a surface with a 0x0 size; in that case,
    /// only internal state is updated and configuration is deferred.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.msaa = create_msaa_target(&self.device, &self.config, self.sample_count);
    }

    /// Acquires the next surface texture and creates an encoder.
    ///
    /// The returned frame owns the surface texture. Releasing it (after submission)
    /// presents the frame.
    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sandbox frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the recorded commands for the given frame.
    ///
    /// Presentation occurs when `surface_texture` is dropped after submission.
    pub fn submit(&self, frame: GpuFrame) {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        drop(frame.view);
        drop(frame.surface_texture);
    }

    /// Clears the current viewport to `clear` and presents.
    ///
    /// A window surface only shows content once a texture is presented, so the
    /// native host does this after every frame. On failure the surface error
    /// has already been handled and the returned action says what to do next.
    pub fn present_clear(&mut self, clear: wgpu::Color) -> std::result::Result<(), SurfaceErrorAction> {
        if self.size.width == 0 || self.size.height == 0 {
            return Err(SurfaceErrorAction::SkipFrame);
        }

        let mut frame = match self.begin_frame() {
            Ok(f) => f,
            Err(err) => return Err(self.handle_surface_error(err)),
        };

        // With MSAA the pass renders into the multisampled target and resolves
        // into the surface texture; the multisampled contents are not kept.
        let (target, resolve_target, store) = match &self.msaa {
            Some(msaa) => (msaa, Some(&frame.view), wgpu::StoreOp::Discard),
            None => (&frame.view, None, wgpu::StoreOp::Store),
        };

        {
            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sandbox clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let Some((x, y, w, h)) = clamp_viewport(self.viewport, self.size) {
                rpass.set_viewport(x, y, w, h, 0.0, 1.0);
            }
        }

        self.submit(frame);
        Ok(())
    }

    /// Converts a `SurfaceError` into a higher-level action.
    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => {
                if self.size.width > 0 && self.size.height > 0 {
                    self.surface.configure(&self.device, &self.config);
                }
                SurfaceErrorAction::Reconfigured
            }
            SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
            SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }
}

impl GraphicsContext for Gpu<'_> {
    fn set_viewport(&mut self, viewport: ViewportRect) {
        self.viewport = viewport;
    }

    fn enable_alpha_blending(&mut self) {
        self.blend = Some(wgpu::BlendState::ALPHA_BLENDING);
    }
}

fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(caps.formats[0])
}

/// 4x MSAA when antialiasing is requested and the format supports it.
fn pick_sample_count(antialias: bool, supported: impl Fn(u32) -> bool) -> u32 {
    if !antialias {
        return 1;
    }
    if supported(4) {
        4
    } else {
        log::warn!("4x msaa unsupported for the surface format, antialiasing disabled");
        1
    }
}

fn create_msaa_target(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    if sample_count <= 1 {
        return None;
    }

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("sandbox msaa target"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
}

/// Intersects `viewport` with the render target. wgpu rejects viewports that
/// leave the target or have no area.
fn clamp_viewport(viewport: ViewportRect, target: PhysicalSize<u32>) -> Option<(f32, f32, f32, f32)> {
    let x0 = viewport.x.max(0) as u32;
    let y0 = viewport.y.max(0) as u32;
    let x1 = (i64::from(viewport.x) + i64::from(viewport.width)).clamp(0, i64::from(target.width)) as u32;
    let y1 = (i64::from(viewport.y) + i64::from(viewport.height)).clamp(0, i64::from(target.height)) as u32;

    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    Some((x0 as f32, y0 as f32, (x1 - x0) as f32, (y1 - y0) as f32))
}
