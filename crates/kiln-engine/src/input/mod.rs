//! Input events and per-tick input state.
//!
//! The window thread translates platform events into [`InputEvent`]s; each one is
//! applied on the logic thread through a pre-tick job, so tick callbacks see
//! [`InputState`] and [`InputFrame`] without locking.

mod frame;
mod state;
mod types;

pub use frame::InputFrame;
pub use state::InputState;
pub use types::{ButtonState, InputEvent, Key, Modifiers, MouseButton, WheelDelta};
