//! Engine loop: three threads driven by one lifecycle.
//!
//! - logic (the caller's thread): ticks the [`World`] at a fixed rate and
//!   submits one render batch per tick
//! - window (`kiln-window`): owns the [`Platform`] and forwards its events as jobs
//! - render (`kiln-render`): owns the [`GpuBackend`] and drains render batches
//!
//! Startup failures on any thread abort the lifecycle; every thread then releases
//! what it started and [`Engine::run_with`] returns the first [`StartupError`].

mod cli;
mod config;
mod handle;
mod logic;
mod panic;
mod render_thread;
mod shared;
mod window_thread;
mod world;

pub use cli::CliArgs;
pub use config::EngineConfig;
pub use handle::EngineHandle;
pub use world::World;

use std::ffi::OsString;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};

use clap::Parser;

use self::logic::{Callbacks, StartFn, TickFn};
use self::shared::Shared;
use crate::device::WgpuBackend;
use crate::error::StartupError;
use crate::logging::init_logging;
use crate::render::{GpuBackend, RenderPipeline, render_queue};
use crate::window::{Platform, WinitPlatform};

pub struct Engine {
    config: EngineConfig,
    shared: Arc<Shared>,
    on_start: Vec<StartFn>,
    on_tick: Vec<TickFn>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared::new()),
            on_start: Vec::new(),
            on_tick: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Handle to this engine; usable before and during `run`.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle::new(Arc::clone(&self.shared))
    }

    /// Runs once on the logic thread, after the render thread is ready and before
    /// the first tick.
    pub fn on_start(mut self, f: impl FnOnce(&mut World) + Send + 'static) -> Self {
        self.on_start.push(Box::new(f));
        self
    }

    /// Runs every tick, between the pre-tick and post-tick queues. Callbacks run in
    /// registration order.
    pub fn on_tick(mut self, f: impl FnMut(&mut World) + Send + 'static) -> Self {
        self.on_tick.push(Box::new(f));
        self
    }

    /// Runs with a winit window and the wgpu backend. Returns once all three
    /// threads have stopped.
    pub fn run(self) -> Result<(), StartupError> {
        let gpu = WgpuBackend::new(self.config.gpu.clone());
        self.run_with(WinitPlatform::new, gpu)
    }

    /// Runs with the given collaborators. `platform` is invoked on the window thread.
    pub fn run_with<P, F, B>(self, platform: F, backend: B) -> Result<(), StartupError>
    where
        P: Platform,
        F: FnOnce() -> P + Send + 'static,
        B: GpuBackend,
    {
        let Engine { config, shared, on_start, on_tick } = self;
        let (submitter, drain) = render_queue(config.overload_threshold);
        let pipeline = RenderPipeline::new(submitter, config.layer_order.clone());

        shared.render_running.store(true, Ordering::Release);

        let window_config = config.window.clone();
        let window = spawn_guarded("window", &shared, move |shared| {
            window_thread::run(shared, platform(), &window_config)
        })
        .map_err(|err| shared.lifecycle.abort(err))
        .ok();

        let priority = config.backend_priority.clone();
        let render = if window.is_some() {
            spawn_guarded("render", &shared, move |shared| {
                render_thread::run(shared, backend, drain, &priority)
            })
            .map_err(|err| shared.lifecycle.abort(err))
            .ok()
        } else {
            None
        };
        if render.is_none() {
            shared.render_running.store(false, Ordering::Release);
        }

        let handle = EngineHandle::new(Arc::clone(&shared));
        let callbacks = Callbacks { on_start, on_tick };
        let logic = panic::catch(|| logic::run(&shared, handle, &config, pipeline, callbacks));
        if let Err(caught) = logic {
            log::error!("logic thread panicked: {caught}");
            shared.lifecycle.abort(StartupError::ThreadPanicked("logic"));
        }

        for handle in [window, render].into_iter().flatten() {
            let name = handle.thread().name().unwrap_or("engine").to_owned();
            if handle.join().is_err() {
                log::error!("{name} thread could not be joined");
            }
        }

        match shared.lifecycle.take_failure() {
            Some(err) => Err(err),
            None => {
                log::info!("engine stopped");
                Ok(())
            }
        }
    }
}

/// Spawns a named engine thread whose panics abort the lifecycle instead of
/// leaving the other threads waiting.
fn spawn_guarded<F>(name: &'static str, shared: &Arc<Shared>, body: F) -> Result<JoinHandle<()>, StartupError>
where
    F: FnOnce(&Shared) + Send + 'static,
{
    let shared = Arc::clone(shared);
    thread::Builder::new()
        .name(format!("kiln-{name}"))
        .spawn(move || {
            log::info!("{name} thread started");
            match panic::catch(|| body(&shared)) {
                Ok(()) => log::info!("{name} thread exiting"),
                Err(caught) => {
                    log::error!("{name} thread panicked: {caught}");
                    shared.lifecycle.abort(StartupError::ThreadPanicked(name));
                }
            }
        })
        .map_err(|source| StartupError::ThreadSpawn { name, source })
}

/// Process entry point: parses `args`, installs logging and runs the engine.
///
/// Exit codes: 0 on a clean shutdown (or `--help`), 2 on a command-line error,
/// 1 if the engine failed to start.
pub fn run<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    run_with_setup(args, |engine| engine)
}

/// Like [`run`], with a hook to register callbacks before the engine starts.
pub fn run_with_setup<I, T, S>(args: I, setup: S) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    S: FnOnce(Engine) -> Engine,
{
    let cli = match CliArgs::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return err.exit_code();
        }
    };

    let config = cli.into_config();
    init_logging(config.logging.clone());

    match setup(Engine::new(config)).run() {
        Ok(()) => 0,
        Err(err) => {
            log::error!("{:#}", anyhow::Error::new(err));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_flag_exits_with_two() {
        assert_eq!(run(["kiln", "--tick-rate", "fast"]), 2);
    }

    #[test]
    fn help_exits_with_zero() {
        assert_eq!(run(["kiln", "--help"]), 0);
    }
}
