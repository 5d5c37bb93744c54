//! Engine lifecycle.
//!
//! A single totally ordered state value shared by the logic, window and render
//! threads. Each thread advances it at fixed points and blocks on it at others;
//! it is the only synchronization primitive used for startup/shutdown ordering.
//!
//! Normal order of transitions and who performs them:
//! - `WindowInit`, `RenderInit`: window thread (before/after platform setup)
//! - `RenderThreadReady`: render thread (after backend init)
//! - `Playing`: logic thread
//! - `ExitRequested`: window thread on close, or anyone through `request_exit`
//! - `MainThreadDone`: logic thread
//! - `RenderThreadDone`: render thread (after the final drain)
//! - `WindowThreadDone`: window thread (after platform teardown)

mod shared;
mod state;

pub use shared::{Lifecycle, WaitOutcome};
pub use state::EngineState;
