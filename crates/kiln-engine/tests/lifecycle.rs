//! Whole-engine runs against scripted collaborators. No display or GPU needed.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use kiln_engine::coords::ColorRgba;
use kiln_engine::input::{ButtonState, InputEvent, Key, Modifiers};
use kiln_engine::job::Job;
use kiln_engine::render::{BackendKind, GpuBackend, RenderItem, SurfaceHandle};
use kiln_engine::scene::{Component, OffloadCtx, Transform};
use kiln_engine::window::{Platform, PlatformEvent, WindowConfig};
use kiln_engine::{Engine, EngineConfig, EngineState, StartupError, World};

type Log = Arc<Mutex<Vec<String>>>;

// ── doubles ───────────────────────────────────────────────────────────────

struct ScriptedPlatform {
    fail_create: bool,
    script: VecDeque<PlatformEvent>,
    log: Log,
}

impl Platform for ScriptedPlatform {
    fn create(&mut self, config: &WindowConfig) -> anyhow::Result<SurfaceHandle> {
        self.log.lock().push("create".into());
        if self.fail_create {
            anyhow::bail!("no display available");
        }
        Ok(SurfaceHandle::headless(config.width, config.height))
    }

    fn poll(&mut self, timeout: Duration, sink: &mut dyn FnMut(PlatformEvent)) {
        match self.script.pop_front() {
            Some(ev) => sink(ev),
            None => thread::sleep(timeout.min(Duration::from_millis(1))),
        }
    }

    fn teardown(&mut self) {
        self.log.lock().push("teardown".into());
    }
}

struct FakeBackend {
    supported: Vec<BackendKind>,
    failing: Vec<BackendKind>,
    log: Log,
    presents: Arc<AtomicUsize>,
}

impl GpuBackend for FakeBackend {
    fn supported_backends(&self) -> Vec<BackendKind> {
        self.supported.clone()
    }

    fn initialize(&mut self, _: &SurfaceHandle, _: u32, _: u32, kind: BackendKind) -> anyhow::Result<()> {
        self.log.lock().push(format!("init {kind}"));
        if self.failing.contains(&kind) {
            anyhow::bail!("{kind} driver missing");
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.log.lock().push("shutdown".into());
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.log.lock().push(format!("resize {width}x{height}"));
    }

    fn clear(&mut self, _: ColorRgba) {}

    fn present(&mut self) {
        self.presents.fetch_add(1, Ordering::SeqCst);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Panics on its first offload, then offloads nothing.
struct FailsOnce {
    failed: Arc<AtomicBool>,
}

impl Component for FailsOnce {
    fn offload(&self, _: &OffloadCtx<'_>) -> Option<RenderItem> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            panic!("first offload fails");
        }
        None
    }
}

struct Harness {
    platform_log: Log,
    backend_log: Log,
    presents: Arc<AtomicUsize>,
    script: Vec<PlatformEvent>,
    fail_create: bool,
    supported: Vec<BackendKind>,
    failing: Vec<BackendKind>,
}

impl Harness {
    fn new() -> Self {
        Self {
            platform_log: Log::default(),
            backend_log: Log::default(),
            presents: Arc::default(),
            script: Vec::new(),
            fail_create: false,
            supported: BackendKind::default_priority().to_vec(),
            failing: Vec::new(),
        }
    }

    fn run(&self, engine: Engine) -> Result<(), StartupError> {
        let platform = ScriptedPlatform {
            fail_create: self.fail_create,
            script: self.script.iter().cloned().collect(),
            log: Arc::clone(&self.platform_log),
        };
        let backend = FakeBackend {
            supported: self.supported.clone(),
            failing: self.failing.clone(),
            log: Arc::clone(&self.backend_log),
            presents: Arc::clone(&self.presents),
        };
        engine.run_with(move || platform, backend)
    }

    fn backend_log(&self) -> Vec<String> {
        self.backend_log.lock().clone()
    }

    fn platform_log(&self) -> Vec<String> {
        self.platform_log.lock().clone()
    }
}

fn engine() -> Engine {
    Engine::new(EngineConfig { tick_rate: 240, ..EngineConfig::default() })
}

fn quit_after(ticks: u64) -> impl FnMut(&mut World) + Send + 'static {
    move |world: &mut World| {
        if world.time.frame_index + 1 >= ticks {
            world.handle().quit();
        }
    }
}

// ── orderly runs ──────────────────────────────────────────────────────────

#[test]
fn lifecycle_passes_through_every_state_in_order() {
    let h = Harness::new();
    let engine = engine().on_tick(quit_after(3));
    let states = engine.handle().observe();

    h.run(engine).unwrap();

    let seen: Vec<EngineState> = states.try_iter().collect();
    assert_eq!(seen, EngineState::ALL.to_vec());
    assert!(h.presents.load(Ordering::SeqCst) >= 1);
    assert_eq!(h.platform_log(), vec!["create", "teardown"]);
    assert_eq!(h.backend_log().last().map(String::as_str), Some("shutdown"));
}

#[test]
fn quit_from_another_thread_stops_the_engine() {
    let h = Harness::new();
    let engine = engine();
    let handle = engine.handle();
    let states = handle.observe();

    let quitter = thread::spawn(move || {
        for state in states.iter() {
            if state == EngineState::Playing {
                handle.quit();
                break;
            }
        }
        handle
    });

    h.run(engine).unwrap();
    let handle = quitter.join().unwrap();
    assert_eq!(handle.state(), EngineState::WindowThreadDone);
}

#[test]
fn close_request_before_playing_still_completes_startup() {
    let mut h = Harness::new();
    h.script.push(PlatformEvent::CloseRequested);
    let started = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&started);

    let engine = engine().on_start(move |_| flag.store(true, Ordering::SeqCst));
    let handle = engine.handle();
    h.run(engine).unwrap();

    assert!(started.load(Ordering::SeqCst));
    assert_eq!(handle.state(), EngineState::WindowThreadDone);
}

#[test]
fn dispatched_job_runs_on_logic_thread() {
    let h = Harness::new();
    let engine = engine();
    let ran_on = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&ran_on);

    engine.handle().dispatch(Job::required("quit", move |world: &mut World| {
        *slot.lock() = thread::current().name().map(str::to_owned);
        world.handle().quit();
    }));
    let caller = thread::current().name().map(str::to_owned);
    h.run(engine).unwrap();

    assert_eq!(*ran_on.lock(), caller);
}

// ── platform events ───────────────────────────────────────────────────────

#[test]
fn resize_event_reaches_world_and_backend() {
    let mut h = Harness::new();
    h.script.push(PlatformEvent::Resized { width: 640, height: 480 });

    let engine = engine().on_tick(|world: &mut World| {
        if world.viewport.physical_width == 640 {
            world.handle().quit();
        }
    });
    h.run(engine).unwrap();

    assert!(h.backend_log().contains(&"resize 640x480".to_string()));
}

#[test]
fn key_press_is_visible_to_tick_callbacks() {
    let mut h = Harness::new();
    h.script.push(PlatformEvent::Input(InputEvent::Key {
        key: Key::Escape,
        state: ButtonState::Pressed,
        modifiers: Modifiers::default(),
        code: 1,
        repeat: false,
    }));

    let held = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&held);

    let engine = engine().on_tick(move |world: &mut World| {
        if world.input_frame.key_pressed(Key::Escape) {
            flag.store(world.input.key_down(Key::Escape), Ordering::SeqCst);
            world.handle().quit();
        }
    });
    h.run(engine).unwrap();

    assert!(held.load(Ordering::SeqCst));
}

// ── tick faults ───────────────────────────────────────────────────────────

#[test]
fn panicking_tick_does_not_stop_the_engine() {
    let h = Harness::new();
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);

    let engine = engine().on_tick(move |world: &mut World| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            panic!("first tick fails");
        }
        if n == 2 {
            world.handle().quit();
        }
    });
    h.run(engine).unwrap();

    assert_eq!(ticks.load(Ordering::SeqCst), 3);
}

#[test]
fn panicking_offload_does_not_stop_the_engine() {
    let h = Harness::new();
    let failed = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&failed);

    let engine = engine()
        .on_start(move |world: &mut World| {
            let e = world.scene.spawn(None, Transform::IDENTITY).unwrap();
            world.scene.add_component(e, FailsOnce { failed: flag }).unwrap();
        })
        .on_tick(quit_after(4));
    h.run(engine).unwrap();

    assert!(failed.load(Ordering::SeqCst));
    // The frame whose offload panicked still presented.
    assert_eq!(h.presents.load(Ordering::SeqCst), 4);
}

// ── startup failures ──────────────────────────────────────────────────────

#[test]
fn platform_failure_is_returned_and_nothing_renders() {
    let mut h = Harness::new();
    h.fail_create = true;
    let started = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&started);

    let engine = engine().on_start(move |_| flag.store(true, Ordering::SeqCst));
    let handle = engine.handle();
    let err = h.run(engine).unwrap_err();

    assert!(matches!(err, StartupError::Platform(_)), "{err}");
    assert!(!started.load(Ordering::SeqCst));
    assert!(h.backend_log().is_empty());
    assert_eq!(h.platform_log(), vec!["create", "teardown"]);
    assert!(handle.state() < EngineState::RenderInit);
}

#[test]
fn backend_failure_reports_every_supported_kind_tried() {
    let mut h = Harness::new();
    h.supported = vec![BackendKind::Vulkan, BackendKind::Gl];
    h.failing = vec![BackendKind::Vulkan, BackendKind::Gl];

    let err = h.run(engine()).unwrap_err();

    match err {
        StartupError::Backend { tried, .. } => {
            assert_eq!(tried, vec![BackendKind::Vulkan, BackendKind::Gl]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.backend_log(), vec!["init vulkan", "init gl"]);
    assert_eq!(h.platform_log(), vec!["create", "teardown"]);
}

#[test]
fn backend_falls_back_to_next_kind() {
    let mut h = Harness::new();
    h.failing = vec![BackendKind::Vulkan];

    h.run(engine().on_tick(quit_after(1))).unwrap();

    let log = h.backend_log();
    assert_eq!(&log[..2], &["init vulkan".to_string(), "init metal".to_string()]);
}
