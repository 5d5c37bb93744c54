use std::any::Any;

use anyhow::{Context, Result};

use super::GpuInit;
use super::surface::{self, SurfaceErrorAction};
use crate::coords::ColorRgba;
use crate::render::{BackendKind, GpuBackend, SurfaceHandle};

/// Work recorded into the current frame after the clear pass.
pub type FramePass = Box<dyn FnOnce(&mut wgpu::CommandEncoder, &wgpu::TextureView) + Send>;

/// wgpu objects that exist between `initialize` and `shutdown`.
struct GpuState {
    kind: BackendKind,
    // Kept alive for the surface's sake.
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'static>,
    _adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
}

/// [`GpuBackend`] on top of wgpu.
///
/// A frame is a clear pass followed by every [`FramePass`] recorded since the last
/// present. Render jobs reach the wgpu device by downcasting:
///
/// ```ignore
/// Job::best_effort("upload", |gpu: &mut DynBackend| {
///     if let Some(wgpu) = gpu.as_any_mut().downcast_mut::<WgpuBackend>() {
///         wgpu.record(|encoder, view| { /* ... */ });
///     }
/// });
/// ```
pub struct WgpuBackend {
    init: GpuInit,
    state: Option<GpuState>,
    clear_color: ColorRgba,
    passes: Vec<FramePass>,
}

impl WgpuBackend {
    pub fn new(init: GpuInit) -> Self {
        Self {
            init,
            state: None,
            clear_color: ColorRgba::black(),
            passes: Vec::new(),
        }
    }

    pub fn device(&self) -> Option<&wgpu::Device> {
        self.state.as_ref().map(|s| &s.device)
    }

    pub fn queue(&self) -> Option<&wgpu::Queue> {
        self.state.as_ref().map(|s| &s.queue)
    }

    pub fn surface_format(&self) -> Option<wgpu::TextureFormat> {
        self.state.as_ref().map(|s| s.config.format)
    }

    pub fn active_backend(&self) -> Option<BackendKind> {
        self.state.as_ref().map(|s| s.kind)
    }

    /// Queues `pass` for the frame that the next `present` submits.
    pub fn record(
        &mut self,
        pass: impl FnOnce(&mut wgpu::CommandEncoder, &wgpu::TextureView) + Send + 'static,
    ) {
        self.passes.push(Box::new(pass));
    }
}

impl Default for WgpuBackend {
    fn default() -> Self {
        Self::new(GpuInit::default())
    }
}

fn wgpu_backends(kind: BackendKind) -> wgpu::Backends {
    match kind {
        BackendKind::Vulkan => wgpu::Backends::VULKAN,
        BackendKind::Metal => wgpu::Backends::METAL,
        BackendKind::Dx12 => wgpu::Backends::DX12,
        BackendKind::Gl => wgpu::Backends::GL,
    }
}

async fn create_state(
    handle: &SurfaceHandle,
    width: u32,
    height: u32,
    kind: BackendKind,
    init: &GpuInit,
) -> Result<GpuState> {
    let window = handle.window().context("surface handle has no native window")?;
    anyhow::ensure!(width > 0 && height > 0, "window has zero size");

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu_backends(kind),
        ..Default::default()
    });

    let surface = instance
        .create_surface(window)
        .context("failed to create wgpu surface")?;

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: init.power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        })
        .await
        .with_context(|| format!("no {kind} adapter for this surface"))?;

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("kiln device"),
            required_features: init.required_features,
            required_limits: init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")?;

    let caps = surface.get_capabilities(&adapter);
    let format = surface::choose_surface_format(&caps, init.prefer_srgb)
        .context("no supported surface formats")?;

    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width,
        height,
        present_mode: init.present_mode,
        alpha_mode: surface::choose_alpha_mode(&caps, init.alpha_mode),
        view_formats: vec![],
        desired_maximum_frame_latency: init.desired_maximum_frame_latency,
    };
    surface.configure(&device, &config);

    Ok(GpuState {
        kind,
        _instance: instance,
        surface,
        _adapter: adapter,
        device,
        queue,
        config,
    })
}

impl GpuBackend for WgpuBackend {
    fn supported_backends(&self) -> Vec<BackendKind> {
        if cfg!(target_os = "windows") {
            vec![BackendKind::Vulkan, BackendKind::Dx12, BackendKind::Gl]
        } else if cfg!(any(target_os = "macos", target_os = "ios")) {
            vec![BackendKind::Metal]
        } else {
            vec![BackendKind::Vulkan, BackendKind::Gl]
        }
    }

    fn initialize(
        &mut self,
        surface: &SurfaceHandle,
        width: u32,
        height: u32,
        kind: BackendKind,
    ) -> Result<()> {
        let state = pollster::block_on(create_state(surface, width, height, kind, &self.init))?;
        log::info!(
            "wgpu backend ready: {kind}, {:?}, {width}x{height}",
            state.config.format
        );
        self.state = Some(state);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.passes.clear();
        if let Some(state) = self.state.take() {
            log::info!("wgpu backend ({}) shut down", state.kind);
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(state) = self.state.as_mut() {
            surface::apply_resize(&state.surface, &state.device, &mut state.config, width, height);
        }
    }

    fn clear(&mut self, color: ColorRgba) {
        self.clear_color = color;
    }

    fn present(&mut self) {
        let Some(state) = self.state.as_mut() else {
            self.passes.clear();
            return;
        };

        let frame = match state.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err) => {
                match surface::map_surface_error(&state.surface, &state.device, &state.config, err) {
                    SurfaceErrorAction::Fatal => log::error!("surface out of memory; frame dropped"),
                    action => log::debug!("surface texture unavailable ({action:?}); frame dropped"),
                }
                self.passes.clear();
                return;
            }
        };

        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = state
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("kiln frame encoder"),
            });

        let c = self.clear_color;
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kiln clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: c.r as f64,
                        g: c.g as f64,
                        b: c.b as f64,
                        a: c.a as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for pass in self.passes.drain(..) {
            pass(&mut encoder, &view);
        }

        state.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
