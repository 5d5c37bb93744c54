use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{ButtonState, InputEvent, Key, Modifiers, MouseButton};
use crate::coords::Vec2;

/// Pixels per wheel line when folding line deltas into [`InputFrame::wheel`].
const WHEEL_LINE_HEIGHT: f32 = 40.0;

/// Held keys/buttons and pointer position, owned by the logic thread.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,
    /// Logical pixels; `None` while the pointer is outside the window.
    pub pointer: Option<Vec2>,
    pub keys_down: HashSet<Key>,
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies `ev` and records its edges into `frame`.
    ///
    /// Key repeats do not produce a second press edge.
    pub fn apply(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match &ev {
            InputEvent::Key { key, state, modifiers, .. } => {
                self.modifiers = *modifiers;
                match state {
                    ButtonState::Pressed => {
                        if self.keys_down.insert(*key) {
                            frame.keys_pressed.insert(*key);
                        }
                    }
                    ButtonState::Released => {
                        if self.keys_down.remove(key) {
                            frame.keys_released.insert(*key);
                        }
                    }
                }
            }

            InputEvent::PointerMoved(p) => self.pointer = Some(*p),

            InputEvent::PointerButton { button, state, position, modifiers } => {
                self.pointer = Some(*position);
                self.modifiers = *modifiers;
                match state {
                    ButtonState::Pressed => {
                        if self.buttons_down.insert(*button) {
                            frame.buttons_pressed.insert(*button);
                        }
                    }
                    ButtonState::Released => {
                        if self.buttons_down.remove(button) {
                            frame.buttons_released.insert(*button);
                        }
                    }
                }
            }

            InputEvent::Wheel { delta, modifiers } => {
                self.modifiers = *modifiers;
                frame.wheel += delta.to_pixels(WHEEL_LINE_HEIGHT);
            }

            InputEvent::Text(text) => frame.text.push_str(text),

            InputEvent::ModifiersChanged(m) => self.modifiers = *m,

            InputEvent::PointerLeft => self.pointer = None,

            InputEvent::Focused(focused) => {
                self.focused = *focused;
                if !focused {
                    // Releases are never delivered to an unfocused window.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }
        }

        frame.events.push(ev);
    }

    #[inline]
    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    #[inline]
    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }
}
