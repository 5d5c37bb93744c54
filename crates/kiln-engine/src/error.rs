//! Engine-level error types.

use thiserror::Error;

use crate::render::BackendKind;

/// Failure that prevents the engine from reaching (or staying in) `Playing`.
///
/// Raised by whichever thread hits it and published through the lifecycle so the
/// other threads can unwind what they already started.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("platform setup failed")]
    Platform(#[source] anyhow::Error),

    #[error("no GPU backend could be initialized (tried {tried:?})")]
    Backend {
        tried: Vec<BackendKind>,
        #[source]
        source: anyhow::Error,
    },

    #[error("window thread did not publish a surface")]
    NoSurface,

    #[error("failed to spawn {name} thread")]
    ThreadSpawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}
