//! Window-thread collaborator.
//!
//! [`Platform`] abstracts the window system; [`WinitPlatform`] is the winit
//! implementation. Platform events are routed to the logic thread as jobs.

mod platform;
mod translate;
mod winit;

pub use platform::{Platform, PlatformEvent, WindowConfig};
pub use self::winit::WinitPlatform;
