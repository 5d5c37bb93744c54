use std::fmt;
use std::sync::Arc;

use crossbeam_channel::Receiver;

use super::World;
use super::shared::Shared;
use crate::job::Job;
use crate::lifecycle::EngineState;

/// Cloneable, thread-safe control surface of a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    shared: Arc<Shared>,
}

impl EngineHandle {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Asks the engine to shut down.
    ///
    /// A request made before the engine is `Playing` takes effect once it is.
    pub fn quit(&self) {
        log::info!("quit requested");
        self.shared.lifecycle.request_exit();
    }

    pub fn state(&self) -> EngineState {
        self.shared.lifecycle.state()
    }

    /// Stream of lifecycle transitions, starting with the current state.
    pub fn observe(&self) -> Receiver<EngineState> {
        self.shared.lifecycle.observe()
    }

    /// Runs `job` on the logic thread, between ticks.
    pub fn dispatch(&self, job: Job<World>) {
        self.shared.dispatch.enqueue(job);
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle").field("state", &self.state()).finish()
    }
}
