//! Tick timing.
//!
//! [`FramePacer`] gates the logic loop at the configured tick rate; [`FrameClock`]
//! measures the delta handed to tick callbacks.

mod frame_clock;
mod pacer;

pub use frame_clock::{FrameClock, FrameTime};
pub use pacer::FramePacer;
