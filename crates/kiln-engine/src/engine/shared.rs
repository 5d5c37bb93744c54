use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::World;
use crate::job::JobQueue;
use crate::lifecycle::Lifecycle;
use crate::render::SurfaceHandle;

/// State reachable from all three engine threads.
pub(crate) struct Shared {
    pub lifecycle: Lifecycle,
    /// Drained at the start of every tick, before callbacks.
    pub pre_tick: JobQueue<World>,
    /// Drained after tick callbacks, before the frame is built.
    pub post_tick: JobQueue<World>,
    /// Main-thread dispatch; drained while the logic thread waits for its next tick.
    pub dispatch: JobQueue<World>,
    /// Published by the window thread between `WindowInit` and `RenderInit`.
    pub surface: Mutex<Option<SurfaceHandle>>,
    /// Drawable size accepted by the window thread and not yet applied to the
    /// backend. Locked by the window thread for the whole of a resize event and by
    /// the render thread for the whole of a pass, so no batch runs between the
    /// window changing size and the backend following it.
    pub resize: Mutex<Option<(u32, u32)>>,
    /// Set before the render thread is spawned; cleared once it has released the
    /// backend.
    pub render_running: AtomicBool,
}

impl Shared {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            pre_tick: JobQueue::new(),
            post_tick: JobQueue::new(),
            dispatch: JobQueue::new(),
            surface: Mutex::new(None),
            resize: Mutex::new(None),
            render_running: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn render_running(&self) -> bool {
        self.render_running.load(Ordering::Acquire)
    }

    /// True once the running loops should wind down.
    #[inline]
    pub fn winding_down(&self) -> bool {
        self.lifecycle.state().is_exiting() || self.lifecycle.is_aborted()
    }
}

/// Clears `render_running` when dropped, including during a panic unwind.
pub(crate) struct RenderRunning<'a>(pub &'a AtomicBool);

impl Drop for RenderRunning<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
