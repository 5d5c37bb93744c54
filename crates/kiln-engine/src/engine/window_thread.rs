use std::time::Duration;

use super::World;
use super::shared::Shared;
use crate::error::StartupError;
use crate::job::Job;
use crate::lifecycle::EngineState;
use crate::window::{Platform, PlatformEvent, WindowConfig};

const POLL_TIMEOUT: Duration = Duration::from_millis(5);

/// Window thread body: owns the platform from creation to teardown.
pub(crate) fn run<P: Platform>(shared: &Shared, mut platform: P, config: &WindowConfig) {
    shared.lifecycle.advance(EngineState::WindowInit);

    let surface = match platform.create(config) {
        Ok(surface) => surface,
        Err(err) => {
            shared.lifecycle.abort(StartupError::Platform(err));
            platform.teardown();
            return;
        }
    };
    log::info!(
        "window '{}' created ({}x{} physical, scale {})",
        config.title,
        surface.width,
        surface.height,
        surface.scale_factor
    );
    *shared.surface.lock() = Some(surface);
    shared.lifecycle.advance(EngineState::RenderInit);

    while !shared.winding_down() {
        platform.poll(POLL_TIMEOUT, &mut |ev| route(shared, ev));
    }

    // The GPU surface borrows the native window; keep pumping until the render
    // thread has let go of it.
    while shared.render_running() {
        platform.poll(POLL_TIMEOUT, &mut |ev| log::trace!("event after exit ignored: {ev:?}"));
    }

    shared.surface.lock().take();
    platform.teardown();

    if !shared.lifecycle.is_aborted() {
        shared.lifecycle.advance(EngineState::WindowThreadDone);
    }
}

/// Turns a platform event into logic-thread work.
fn route(shared: &Shared, ev: PlatformEvent) {
    match ev {
        PlatformEvent::Resized { width, height } => {
            let mut pending = shared.resize.lock();
            *pending = Some((width, height));
            if let Some(surface) = shared.surface.lock().as_mut() {
                surface.width = width;
                surface.height = height;
            }
            shared.pre_tick.enqueue(Job::required("resize", move |world: &mut World| {
                world.on_resize(width, height)
            }));
        }
        PlatformEvent::Input(input) => {
            shared.pre_tick.enqueue(Job::required("input", move |world: &mut World| {
                world.input.apply(&mut world.input_frame, input)
            }));
        }
        PlatformEvent::Occluded(occluded) => {
            shared.post_tick.enqueue(Job::required("occlusion", move |world: &mut World| {
                world.visible = !occluded
            }));
        }
        PlatformEvent::CloseRequested => {
            log::info!("window close requested");
            shared.lifecycle.request_exit();
        }
    }
}
