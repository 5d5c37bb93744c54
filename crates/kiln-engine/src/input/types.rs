use std::fmt;

use crate::coords::Vec2;

/// Keyboard key identifier.
///
/// Platform keycodes are mapped onto these variants where possible; anything else
/// arrives as `Key::Unknown` with a stable platform code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Shift,
    Control,
    Alt,
    Meta,

    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    Unknown(u32),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Pressed / released, shared by keys and buttons.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ButtonState {
    Pressed,
    Released,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Wheel motion. `Lines` comes from notched wheels, `Pixels` from touchpads.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum WheelDelta {
    Lines(Vec2),
    Pixels(Vec2),
}

impl WheelDelta {
    /// Delta in logical pixels, treating one line as `line_height` pixels.
    pub fn to_pixels(self, line_height: f32) -> Vec2 {
        match self {
            WheelDelta::Lines(v) => v * line_height,
            WheelDelta::Pixels(v) => v,
        }
    }
}

/// Platform-agnostic input event, translated on the window thread and applied on
/// the logic thread.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key {
        key: Key,
        state: ButtonState,
        modifiers: Modifiers,
        /// Stable platform code when available (e.g. scancode).
        code: u32,
        repeat: bool,
    },

    /// Pointer position in logical pixels.
    PointerMoved(Vec2),

    PointerButton {
        button: MouseButton,
        state: ButtonState,
        position: Vec2,
        modifiers: Modifiers,
    },

    Wheel {
        delta: WheelDelta,
        modifiers: Modifiers,
    },

    /// Committed text (not IME composition).
    Text(String),

    ModifiersChanged(Modifiers),

    PointerLeft,

    Focused(bool),
}
