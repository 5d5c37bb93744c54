//! Kiln engine crate.
//!
//! Execution core of the engine: the three-thread lifecycle, job queues and the
//! render job pipeline, the scene with its transform hierarchies, and the
//! winit/wgpu collaborators the loop runs against by default.

pub mod coords;
pub mod device;
pub mod engine;
pub mod error;
pub mod input;
pub mod job;
pub mod lifecycle;
pub mod logging;
pub mod render;
pub mod scene;
pub mod time;
pub mod window;

pub use engine::{Engine, EngineConfig, EngineHandle, World, run, run_with_setup};
pub use error::StartupError;
pub use lifecycle::EngineState;
