use std::time::Duration;

use anyhow::anyhow;

use super::shared::{RenderRunning, Shared};
use crate::error::StartupError;
use crate::lifecycle::EngineState;
use crate::render::{BackendKind, GpuBackend, RenderDrain, SurfaceHandle};

/// Longest wait for a batch before the loop re-checks the lifecycle.
const BATCH_WAIT: Duration = Duration::from_millis(2);

/// Render thread body: owns the backend from initialization to shutdown.
pub(crate) fn run<B: GpuBackend>(
    shared: &Shared,
    mut backend: B,
    mut drain: RenderDrain,
    priority: &[BackendKind],
) {
    let _running = RenderRunning(&shared.render_running);

    if !shared.lifecycle.wait_for(EngineState::RenderInit).is_reached() {
        log::info!("render thread exiting: startup aborted");
        return;
    }

    let Some(surface) = shared.surface.lock().clone() else {
        shared.lifecycle.abort(StartupError::NoSurface);
        return;
    };

    let kind = match initialize(&mut backend, &surface, priority) {
        Ok(kind) => kind,
        Err(err) => {
            shared.lifecycle.abort(err);
            return;
        }
    };
    log::info!("render backend: {kind}");
    shared.lifecycle.advance(EngineState::RenderThreadReady);

    let mut frames = 0u64;
    while !shared.lifecycle.is_at_least(EngineState::MainThreadDone) && !shared.lifecycle.is_aborted() {
        let ready = drain.wait(BATCH_WAIT);
        frames += pass(shared, &mut backend, &mut drain, ready) as u64;
    }

    let last = {
        let mut pending = shared.resize.lock();
        apply_pending(&mut pending, &mut backend);
        drain.drain_required(&mut backend)
    };
    log::info!(
        "render loop stopped after {} batches; final drain ran {} required jobs, skipped {}",
        frames + last.batches as u64,
        last.executed,
        last.skipped
    );

    backend.shutdown();
    if !shared.lifecycle.is_aborted() {
        shared.lifecycle.advance(EngineState::RenderThreadDone);
    }
}

/// One render pass under the resize lock: a pending resize reaches the backend
/// before any queued batch runs. Returns the number of batches drained.
fn pass<B: GpuBackend>(shared: &Shared, backend: &mut B, drain: &mut RenderDrain, ready: bool) -> usize {
    let mut pending = shared.resize.lock();
    apply_pending(&mut pending, backend);
    if ready { drain.drain(backend).batches } else { 0 }
}

fn apply_pending<B: GpuBackend>(pending: &mut Option<(u32, u32)>, backend: &mut B) {
    if let Some((width, height)) = pending.take() {
        log::debug!("resizing backend to {width}x{height}");
        backend.resize(width, height);
    }
}

/// Tries each configured kind the backend reports as supported, in order.
fn initialize<B: GpuBackend>(
    backend: &mut B,
    surface: &SurfaceHandle,
    priority: &[BackendKind],
) -> Result<BackendKind, StartupError> {
    let supported = backend.supported_backends();
    let mut tried = Vec::new();
    let mut last_err = None;

    for &kind in priority {
        if !supported.contains(&kind) {
            log::debug!("skipping {kind}: not supported on this platform");
            continue;
        }
        tried.push(kind);
        match backend.initialize(surface, surface.width, surface.height, kind) {
            Ok(()) => return Ok(kind),
            Err(err) => {
                log::warn!("{kind} backend unavailable: {err:#}");
                last_err = Some(err);
            }
        }
    }

    Err(StartupError::Backend {
        tried,
        source: last_err.unwrap_or_else(|| anyhow!("none of the configured backends is supported")),
    })
}
