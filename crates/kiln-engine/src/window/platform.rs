use std::time::Duration;

use crate::input::InputEvent;
use crate::render::SurfaceHandle;

/// Initial window parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    /// Logical size.
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "kiln".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Window-system event as seen by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// New drawable size in physical pixels.
    Resized { width: u32, height: u32 },
    Input(InputEvent),
    Occluded(bool),
    CloseRequested,
}

/// The window-system collaborator driven by the window thread.
///
/// OS event loops are usually bound to the thread that created them, so a platform
/// is constructed on the window thread and never leaves it.
pub trait Platform {
    /// Opens the window and returns the handle the render thread binds to.
    fn create(&mut self, config: &WindowConfig) -> anyhow::Result<SurfaceHandle>;

    /// Delivers every pending event to `sink`, waiting at most `timeout` for the
    /// first one.
    fn poll(&mut self, timeout: Duration, sink: &mut dyn FnMut(PlatformEvent));

    /// Closes the window. Called once, after the render thread has released the
    /// surface.
    fn teardown(&mut self);
}
