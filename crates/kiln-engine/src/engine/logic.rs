use std::time::Duration;

use super::panic;
use super::shared::Shared;
use super::{EngineConfig, EngineHandle, World};
use crate::coords::Viewport;
use crate::lifecycle::EngineState;
use crate::render::{FrameBuilder, RenderPipeline};
use crate::time::{FrameClock, FramePacer};

/// Longest single wait on the dispatch queue, so exit requests are seen promptly.
const IDLE_WAIT: Duration = Duration::from_millis(5);

pub(crate) type StartFn = Box<dyn FnOnce(&mut World) + Send>;
pub(crate) type TickFn = Box<dyn FnMut(&mut World) + Send>;

pub(crate) struct Callbacks {
    pub on_start: Vec<StartFn>,
    pub on_tick: Vec<TickFn>,
}

/// Logic thread body. Runs on the thread that called `Engine::run`.
pub(crate) fn run(
    shared: &Shared,
    handle: EngineHandle,
    config: &EngineConfig,
    mut pipeline: RenderPipeline,
    callbacks: Callbacks,
) {
    let Callbacks { on_start, mut on_tick } = callbacks;

    if !shared.lifecycle.wait_for(EngineState::RenderThreadReady).is_reached() {
        log::info!("logic thread exiting: startup aborted");
        return;
    }

    let viewport = shared
        .surface
        .lock()
        .as_ref()
        .map(|s| Viewport::new(s.width, s.height, s.scale_factor))
        .unwrap_or_default();
    let mut world = World::new(handle, viewport, config.clear_color);

    for f in on_start {
        guarded("start callback", || f(&mut world));
    }

    shared.lifecycle.advance(EngineState::Playing);
    log::info!("playing at {} Hz", config.tick_rate);

    let mut clock = FrameClock::new();
    let mut pacer = FramePacer::new(config.tick_rate);
    let mut ticks = 0u64;

    while !shared.winding_down() {
        let wait = pacer.remaining().min(IDLE_WAIT);
        guarded("dispatch", || {
            shared.dispatch.drain_timeout(&mut world, wait);
        });
        if !pacer.ready() {
            continue;
        }

        guarded("tick", || tick(shared, &mut world, &mut clock, &mut on_tick));
        ticks += 1;

        let report = pipeline.submit(build_frame(&world));
        log::trace!("tick {}: {} render jobs submitted", world.time.frame_index, report.submitted);
        world.scene.clear_dirty();
        world.input_frame.clear();
    }

    log::info!(
        "logic loop stopped after {} ticks, {} frames shed",
        ticks,
        pipeline.skipped_frames()
    );

    shared.lifecycle.advance(EngineState::MainThreadDone);
    shared.lifecycle.wait_for(EngineState::WindowThreadDone);
}

/// Pre-tick jobs, clock, tick callbacks, post-tick jobs.
fn tick(shared: &Shared, world: &mut World, clock: &mut FrameClock, on_tick: &mut [TickFn]) {
    shared.pre_tick.drain(world);
    world.time = clock.tick();
    for f in on_tick.iter_mut() {
        f(world);
    }
    shared.post_tick.drain(world);
}

/// Required jobs first, then component offloads. A panicking offload drops every
/// offloaded item of this tick; the required jobs still go out.
fn build_frame(world: &World) -> FrameBuilder {
    let mut frame = world.required_frame();
    let mut offloads = FrameBuilder::new();
    if guarded("offload", || world.offload(&mut offloads)) {
        frame.append(offloads);
    }
    frame
}

/// Runs `f`, logging a panic with the stack of the panicking frame instead of
/// unwinding further. Partial mutations made before the panic are kept.
fn guarded(what: &str, f: impl FnOnce()) -> bool {
    match panic::catch(f) {
        Ok(()) => true,
        Err(caught) => {
            log::error!("{what} panicked: {caught}");
            false
        }
    }
}
