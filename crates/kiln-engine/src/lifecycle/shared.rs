use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use crate::error::StartupError;

use super::EngineState;

/// Result of blocking on the lifecycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WaitOutcome {
    /// The target (or a later state) was observed; carries the observed state.
    Reached(EngineState),
    /// The deadline passed first.
    TimedOut,
    /// Startup failed somewhere; the target will never be reached.
    Aborted,
}

impl WaitOutcome {
    #[inline]
    pub fn is_reached(self) -> bool {
        matches!(self, WaitOutcome::Reached(_))
    }
}

struct Gate {
    exit_pending: bool,
    failure: Option<StartupError>,
    observers: Vec<Sender<EngineState>>,
}

/// Shared lifecycle state for the three engine threads.
///
/// The state itself is an atomic read with relaxed ordering; hot loops only poll it.
/// Blocking waits park on a condition variable that every transition signals, so
/// idle threads do not spin. Transitions are monotonic: advancing to a state that is
/// not later than the current one is a no-op.
pub struct Lifecycle {
    state: AtomicU8,
    aborted: AtomicBool,
    gate: Mutex<Gate>,
    changed: Condvar,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(EngineState::FirstInit.as_u8()),
            aborted: AtomicBool::new(false),
            gate: Mutex::new(Gate {
                exit_pending: false,
                failure: None,
                observers: Vec::new(),
            }),
            changed: Condvar::new(),
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn is_at_least(&self, state: EngineState) -> bool {
        self.state() >= state
    }

    /// True once any thread reported a startup failure.
    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Relaxed)
    }

    /// Moves the state forward to `next`.
    ///
    /// Returns `false` (and changes nothing) if the current state is already `next`
    /// or later. An exit requested before `Playing` is applied as soon as `Playing`
    /// is reached.
    pub fn advance(&self, next: EngineState) -> bool {
        let mut gate = self.gate.lock();
        let moved = self.advance_locked(&mut gate, next);
        if moved && next == EngineState::Playing && gate.exit_pending {
            self.advance_locked(&mut gate, EngineState::ExitRequested);
        }
        drop(gate);

        if moved {
            self.changed.notify_all();
        }
        moved
    }

    /// Requests an orderly shutdown.
    ///
    /// Before `Playing` the request is only recorded, so startup is never torn down
    /// half-way; it takes effect on the `Playing` transition.
    pub fn request_exit(&self) {
        let mut gate = self.gate.lock();
        gate.exit_pending = true;
        let moved = self.state() >= EngineState::Playing
            && self.advance_locked(&mut gate, EngineState::ExitRequested);
        drop(gate);

        if moved {
            self.changed.notify_all();
        }
    }

    /// True if an exit was requested, whether or not it has been applied yet.
    pub fn exit_pending(&self) -> bool {
        self.state().is_exiting() || self.gate.lock().exit_pending
    }

    /// Records a startup failure and wakes every waiter.
    ///
    /// Only the first failure is kept; later ones are logged and dropped.
    pub fn abort(&self, err: StartupError) {
        let mut gate = self.gate.lock();
        if gate.failure.is_none() {
            log::error!("startup failed: {err:#}");
            gate.failure = Some(err);
        } else {
            log::debug!("additional startup failure ignored: {err:#}");
        }
        self.aborted.store(true, Ordering::Relaxed);
        drop(gate);

        self.changed.notify_all();
    }

    /// Takes the recorded startup failure, if any.
    pub fn take_failure(&self) -> Option<StartupError> {
        self.gate.lock().failure.take()
    }

    /// Blocks until the state is at least `target` or startup is aborted.
    pub fn wait_for(&self, target: EngineState) -> WaitOutcome {
        self.wait_until(target, None)
    }

    /// Like [`wait_for`](Self::wait_for) but gives up after `timeout`.
    pub fn wait_for_timeout(&self, target: EngineState, timeout: Duration) -> WaitOutcome {
        self.wait_until(target, Some(Instant::now() + timeout))
    }

    /// Returns a stream of every transition made after this call.
    ///
    /// The current state is delivered first.
    pub fn observe(&self) -> Receiver<EngineState> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut gate = self.gate.lock();
        let _ = tx.send(self.state());
        gate.observers.push(tx);
        rx
    }

    fn advance_locked(&self, gate: &mut Gate, next: EngineState) -> bool {
        let prev = EngineState::from_u8(self.state.fetch_max(next.as_u8(), Ordering::Relaxed));
        if prev >= next {
            return false;
        }

        if prev.next() != Some(next) {
            log::warn!("lifecycle skipped from {prev} to {next}");
        }
        log::debug!("lifecycle: {prev} -> {next}");

        gate.observers.retain(|tx| tx.send(next).is_ok());
        true
    }

    fn wait_until(&self, target: EngineState, deadline: Option<Instant>) -> WaitOutcome {
        if self.is_at_least(target) {
            return WaitOutcome::Reached(self.state());
        }

        let mut gate = self.gate.lock();
        loop {
            let current = self.state();
            if current >= target {
                return WaitOutcome::Reached(current);
            }
            if self.is_aborted() {
                return WaitOutcome::Aborted;
            }

            match deadline {
                None => self.changed.wait(&mut gate),
                Some(deadline) => {
                    if self.changed.wait_until(&mut gate, deadline).timed_out() {
                        let current = self.state();
                        return if current >= target {
                            WaitOutcome::Reached(current)
                        } else if self.is_aborted() {
                            WaitOutcome::Aborted
                        } else {
                            WaitOutcome::TimedOut
                        };
                    }
                }
            }
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state())
            .field("aborted", &self.is_aborted())
            .finish()
    }
}
