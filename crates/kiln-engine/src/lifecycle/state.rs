use std::fmt;

/// Process lifecycle state.
///
/// Variants are declared in transition order; the derived `Ord` is the lifecycle
/// order. A thread observing a value may assume every lower state was reached.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(u8)]
pub enum EngineState {
    FirstInit = 0,
    WindowInit,
    RenderInit,
    RenderThreadReady,
    Playing,
    ExitRequested,
    MainThreadDone,
    RenderThreadDone,
    WindowThreadDone,
}

impl EngineState {
    pub const ALL: [EngineState; 9] = [
        EngineState::FirstInit,
        EngineState::WindowInit,
        EngineState::RenderInit,
        EngineState::RenderThreadReady,
        EngineState::Playing,
        EngineState::ExitRequested,
        EngineState::MainThreadDone,
        EngineState::RenderThreadDone,
        EngineState::WindowThreadDone,
    ];

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Inverse of `as_u8`. Out-of-range values saturate to the terminal state.
    #[inline]
    pub fn from_u8(v: u8) -> Self {
        Self::ALL
            .get(v as usize)
            .copied()
            .unwrap_or(EngineState::WindowThreadDone)
    }

    /// The state that directly follows this one, if any.
    #[inline]
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self as usize + 1).copied()
    }

    /// True once the engine has started shutting down.
    #[inline]
    pub fn is_exiting(self) -> bool {
        self >= EngineState::ExitRequested
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
