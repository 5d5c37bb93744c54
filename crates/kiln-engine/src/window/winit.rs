use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use super::translate::Translator;
use super::{Platform, PlatformEvent, WindowConfig};
use crate::render::SurfaceHandle;

/// Pumps allowed for the first `resumed` to arrive before window creation fails.
const CREATE_PUMP_LIMIT: usize = 200;
const CREATE_PUMP_TIMEOUT: Duration = Duration::from_millis(10);

/// [`Platform`] backed by a winit window.
///
/// Events are pumped rather than handed to `run_app`, so the window thread keeps
/// control of its own loop.
#[derive(Default)]
pub struct WinitPlatform {
    event_loop: Option<EventLoop<()>>,
    state: WinitState,
    exited: bool,
}

impl WinitPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Default)]
struct WinitState {
    config: WindowConfig,
    window: Option<Arc<Window>>,
    create_error: Option<anyhow::Error>,
    translator: Translator,
    pending: Vec<PlatformEvent>,
}

impl WinitState {
    fn push_size(&mut self) {
        if let Some(window) = &self.window {
            let size = window.inner_size();
            self.pending.push(PlatformEvent::Resized { width: size.width, height: size.height });
        }
    }
}

impl ApplicationHandler for WinitState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.create_error.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width as f64, self.config.height as f64));

        match event_loop.create_window(attrs).context("failed to create window") {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(err) => self.create_error = Some(err),
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::CloseRequested => self.pending.push(PlatformEvent::CloseRequested),
            WindowEvent::Resized(size) => self.pending.push(PlatformEvent::Resized {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::ScaleFactorChanged { .. } => self.push_size(),
            WindowEvent::Occluded(occluded) => self.pending.push(PlatformEvent::Occluded(*occluded)),
            _ => {}
        }

        let scale = self.window.as_ref().map_or(1.0, |w| w.scale_factor());
        if let Some(input) = self.translator.translate(scale, &event) {
            self.pending.push(PlatformEvent::Input(input));
        }
    }
}

impl Platform for WinitPlatform {
    fn create(&mut self, config: &WindowConfig) -> Result<SurfaceHandle> {
        let mut builder = EventLoop::builder();
        allow_any_thread(&mut builder);
        let mut event_loop = builder.build().context("failed to create winit event loop")?;

        self.state.config = config.clone();

        // The window is created from `resumed`, which only arrives through a pump.
        for _ in 0..CREATE_PUMP_LIMIT {
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(CREATE_PUMP_TIMEOUT), &mut self.state)
            {
                bail!("event loop exited during window creation (code {code})");
            }
            if let Some(err) = self.state.create_error.take() {
                return Err(err);
            }
            if let Some(window) = &self.state.window {
                let size = window.inner_size();
                let handle = SurfaceHandle::new(
                    window.clone(),
                    size.width,
                    size.height,
                    window.scale_factor() as f32,
                );
                self.event_loop = Some(event_loop);
                return Ok(handle);
            }
        }
        bail!("window was not created after {CREATE_PUMP_LIMIT} event pumps")
    }

    fn poll(&mut self, timeout: Duration, sink: &mut dyn FnMut(PlatformEvent)) {
        let event_loop = match self.event_loop.as_mut() {
            Some(event_loop) if !self.exited => event_loop,
            _ => {
                std::thread::sleep(timeout);
                return;
            }
        };

        if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(timeout), &mut self.state) {
            log::debug!("winit event loop exited (code {code})");
            self.exited = true;
            self.state.pending.push(PlatformEvent::CloseRequested);
        }

        for ev in self.state.pending.drain(..) {
            sink(ev);
        }
    }

    fn teardown(&mut self) {
        self.state.window = None;
        self.state.pending.clear();
        self.event_loop = None;
    }
}

#[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
fn allow_any_thread(builder: &mut winit::event_loop::EventLoopBuilder<()>) {
    winit::platform::x11::EventLoopBuilderExtX11::with_any_thread(builder, true);
}

#[cfg(target_os = "windows")]
fn allow_any_thread(builder: &mut winit::event_loop::EventLoopBuilder<()>) {
    winit::platform::windows::EventLoopBuilderExtWindows::with_any_thread(builder, true);
}

// macOS only allows an event loop on the process main thread.
#[cfg(not(any(
    target_os = "windows",
    all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android")))
)))]
fn allow_any_thread(_builder: &mut winit::event_loop::EventLoopBuilder<()>) {}
