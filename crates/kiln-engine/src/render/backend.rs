use std::any::Any;
use std::fmt;
use std::sync::Arc;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::coords::ColorRgba;

/// GPU API a backend can be initialized against, in the order the engine tries them
/// by default.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, clap::ValueEnum)]
pub enum BackendKind {
    Vulkan,
    Metal,
    Dx12,
    Gl,
}

impl BackendKind {
    pub const fn default_priority() -> [BackendKind; 4] {
        [BackendKind::Vulkan, BackendKind::Metal, BackendKind::Dx12, BackendKind::Gl]
    }

    pub const fn name(self) -> &'static str {
        match self {
            BackendKind::Vulkan => "vulkan",
            BackendKind::Metal => "metal",
            BackendKind::Dx12 => "dx12",
            BackendKind::Gl => "gl",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything that exposes native window and display handles and may cross threads.
pub trait NativeWindow: HasWindowHandle + HasDisplayHandle + Send + Sync {}

impl<T: HasWindowHandle + HasDisplayHandle + Send + Sync> NativeWindow for T {}

/// Window-side surface description published by the window thread for the render
/// thread to bind a backend to.
///
/// The native window is reference counted so it outlives any GPU surface made from it.
#[derive(Clone)]
pub struct SurfaceHandle {
    window: Option<Arc<dyn NativeWindow>>,
    /// Drawable size in physical pixels.
    pub width: u32,
    pub height: u32,
    pub scale_factor: f32,
}

impl SurfaceHandle {
    pub fn new(window: Arc<dyn NativeWindow>, width: u32, height: u32, scale_factor: f32) -> Self {
        Self { window: Some(window), width, height, scale_factor }
    }

    /// A surface with no native window, for backends that never present.
    pub fn headless(width: u32, height: u32) -> Self {
        Self { window: None, width, height, scale_factor: 1.0 }
    }

    pub fn window(&self) -> Option<Arc<dyn NativeWindow>> {
        self.window.clone()
    }

    #[inline]
    pub fn is_headless(&self) -> bool {
        self.window.is_none()
    }
}

impl fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceHandle")
            .field("headless", &self.is_headless())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("scale_factor", &self.scale_factor)
            .finish()
    }
}

/// The graphics collaborator driven by the render thread.
///
/// Every call happens on the render thread. Render jobs receive the backend as
/// `&mut dyn GpuBackend` and may downcast through [`as_any_mut`](Self::as_any_mut) to
/// reach backend-specific API.
pub trait GpuBackend: Send + 'static {
    /// Kinds this backend can possibly initialize on the current platform. The
    /// render thread skips configured kinds that are not listed.
    fn supported_backends(&self) -> Vec<BackendKind> {
        BackendKind::default_priority().to_vec()
    }

    /// Binds to `surface` using `kind`. An error means this kind is unavailable and the
    /// caller may try the next one; the backend must be left uninitialized.
    fn initialize(
        &mut self,
        surface: &SurfaceHandle,
        width: u32,
        height: u32,
        kind: BackendKind,
    ) -> anyhow::Result<()>;

    /// Releases all GPU resources. Called once, after the final drain.
    fn shutdown(&mut self);

    fn resize(&mut self, width: u32, height: u32);

    /// Sets the color the next frame starts from.
    fn clear(&mut self, color: ColorRgba);

    /// Finishes and presents the current frame.
    fn present(&mut self);

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
