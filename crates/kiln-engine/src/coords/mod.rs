//! Coordinate and geometry types for the 2D (UI) hierarchy.
//!
//! Canonical 2D space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left
//! - +X right, +Y down
//!
//! 3D transforms use `glam` directly; these types only cover the UI plane.

mod color;
mod rect;
mod vec2;
mod viewport;

pub use color::ColorRgba;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
