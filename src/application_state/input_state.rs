//! # Input State
//!
//! This module defines the input state types used by the input manager: the keys and
//! buttons the engine listens to, the events an input source sends, and the per-tick
//! snapshot handed to the engine.

use std::collections::HashMap;

/// Keys the engine has bindings for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    ShiftLeft,
    /// Toggles first/third person.
    P,
    /// Selects hyperbolic, flat and spherical curvature.
    Digit1,
    Digit2,
    Digit3,
    /// Raises and lowers curvature while held.
    Equal,
    Minus,
    /// Logs terrain status.
    F3,
    Escape,
}

impl Key {
    /// Every key tracked by the input manager.
    pub const ALL: [Key; 14] = [
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::Space,
        Key::ShiftLeft,
        Key::P,
        Key::Digit1,
        Key::Digit2,
        Key::Digit3,
        Key::Equal,
        Key::Minus,
        Key::F3,
        Key::Escape,
    ];

    /// Looks a key up by a short name such as `w`, `space` or `1`.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name.to_ascii_lowercase().as_str() {
            "w" => Key::W,
            "a" => Key::A,
            "s" => Key::S,
            "d" => Key::D,
            "space" => Key::Space,
            "shift" => Key::ShiftLeft,
            "p" => Key::P,
            "1" => Key::Digit1,
            "2" => Key::Digit2,
            "3" => Key::Digit3,
            "=" | "+" => Key::Equal,
            "-" => Key::Minus,
            "f3" => Key::F3,
            "escape" | "esc" => Key::Escape,
            _ => return None,
        };
        Some(key)
    }
}

/// Mouse buttons the engine has bindings for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub const ALL: [MouseButton; 3] = [MouseButton::Left, MouseButton::Right, MouseButton::Middle];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "left" => Some(MouseButton::Left),
            "right" => Some(MouseButton::Right),
            "middle" => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

/// An input event sent to the application by whatever owns the window or terminal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Absolute cursor position in pixels.
    MouseMoved { x: f64, y: f64 },
    MouseButtonDown(MouseButton),
    MouseButtonUp(MouseButton),
    /// Viewport size in pixels.
    Resized { width: u32, height: u32 },
    Focused(bool),
    Quit,
}

impl InputEvent {
    /// Parses one line of a text input script.
    ///
    /// Accepted forms are `down <key>`, `up <key>`, `move <x> <y>`,
    /// `press <button>`, `release <button>`, `resize <w> <h>`, `focus <on|off>` and
    /// `quit`. Anything else yields `None`.
    pub fn from_command(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let command = words.next()?;
        let event = match command {
            "down" => InputEvent::KeyDown(Key::from_name(words.next()?)?),
            "up" => InputEvent::KeyUp(Key::from_name(words.next()?)?),
            "move" => InputEvent::MouseMoved {
                x: words.next()?.parse().ok()?,
                y: words.next()?.parse().ok()?,
            },
            "press" => InputEvent::MouseButtonDown(MouseButton::from_name(words.next()?)?),
            "release" => InputEvent::MouseButtonUp(MouseButton::from_name(words.next()?)?),
            "resize" => InputEvent::Resized {
                width: words.next()?.parse().ok()?,
                height: words.next()?.parse().ok()?,
            },
            "focus" => match words.next()? {
                "on" => InputEvent::Focused(true),
                "off" => InputEvent::Focused(false),
                _ => return None,
            },
            "quit" => InputEvent::Quit,
            _ => return None,
        };
        Some(event)
    }
}

/// Represents the state of a key or button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawInputState {
    /// Key/button is not pressed
    #[default]
    NotPressed,
    /// Key/button was just pressed this tick
    Pressed,
    /// Key/button has been held down for multiple ticks
    Held,
    /// Key/button was just released this tick
    Released,
}

impl RawInputState {
    /// Determines if the input is actively down (either pressed or held)
    pub fn is_active(&self) -> bool {
        matches!(self, RawInputState::Pressed | RawInputState::Held)
    }

    /// Determines if the input was just pressed this tick
    pub fn is_just_pressed(&self) -> bool {
        matches!(self, RawInputState::Pressed)
    }

    pub fn is_just_released(&self) -> bool {
        matches!(self, RawInputState::Released)
    }

    /// Derives the transition from the previous and current down/up states
    pub fn from_raw_states(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (false, true) => RawInputState::Pressed,
            (true, true) => RawInputState::Held,
            (true, false) => RawInputState::Released,
            (false, false) => RawInputState::NotPressed,
        }
    }
}

/// A snapshot of the processed input states with state transitions.
///
/// Key and button states are translated into [`RawInputState`] values.
#[derive(Debug, Clone, Default)]
pub struct ProcessedInputState {
    /// Current state of all tracked keyboard keys
    pub keyboard_states: HashMap<Key, RawInputState>,

    /// Current state of mouse buttons
    pub mouse_button_states: HashMap<MouseButton, RawInputState>,

    /// Latest cursor position, if the cursor moved this tick
    pub cursor_position: Option<(f64, f64)>,

    /// Whether the window regained focus this tick
    pub focus_regained: bool,
}

impl ProcessedInputState {
    /// Gets the state of a keyboard key
    pub fn get_key_state(&self, key: Key) -> RawInputState {
        self.keyboard_states.get(&key).copied().unwrap_or_default()
    }

    /// Gets the state of a mouse button
    pub fn get_mouse_button_state(&self, button: MouseButton) -> RawInputState {
        self.mouse_button_states.get(&button).copied().unwrap_or_default()
    }

    pub fn get_cursor_position(&self) -> Option<(f64, f64)> {
        self.cursor_position
    }
}

/// Tracks the state of mouse inputs including buttons and cursor movement.
#[derive(Debug, Default)]
pub struct MouseInput {
    /// Previous state of each mouse button (pressed/released)
    pub mouse_button_inputs_old: HashMap<MouseButton, bool>,
    /// Current state of each mouse button (pressed/released)
    pub mouse_button_inputs_new: HashMap<MouseButton, bool>,

    /// Latest cursor position since the last tick
    pub cursor_position: Option<(f64, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_follow_previous_and_current() {
        assert_eq!(RawInputState::from_raw_states(false, true), RawInputState::Pressed);
        assert_eq!(RawInputState::from_raw_states(true, true), RawInputState::Held);
        assert_eq!(RawInputState::from_raw_states(true, false), RawInputState::Released);
        assert_eq!(RawInputState::from_raw_states(false, false), RawInputState::NotPressed);
        assert!(RawInputState::Held.is_active());
        assert!(!RawInputState::Held.is_just_pressed());
    }

    #[test]
    fn commands_parse_into_events() {
        assert_eq!(InputEvent::from_command("down w"), Some(InputEvent::KeyDown(Key::W)));
        assert_eq!(InputEvent::from_command("up space"), Some(InputEvent::KeyUp(Key::Space)));
        assert_eq!(
            InputEvent::from_command("move 12.5 -3"),
            Some(InputEvent::MouseMoved { x: 12.5, y: -3.0 })
        );
        assert_eq!(
            InputEvent::from_command("press left"),
            Some(InputEvent::MouseButtonDown(MouseButton::Left))
        );
        assert_eq!(
            InputEvent::from_command("resize 1280 720"),
            Some(InputEvent::Resized { width: 1280, height: 720 })
        );
        assert_eq!(InputEvent::from_command("focus off"), Some(InputEvent::Focused(false)));
        assert_eq!(InputEvent::from_command("quit"), Some(InputEvent::Quit));
    }

    #[test]
    fn malformed_commands_are_rejected() {
        assert_eq!(InputEvent::from_command(""), None);
        assert_eq!(InputEvent::from_command("down"), None);
        assert_eq!(InputEvent::from_command("down q"), None);
        assert_eq!(InputEvent::from_command("move 1"), None);
        assert_eq!(InputEvent::from_command("jump"), None);
    }
}
