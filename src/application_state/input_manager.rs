//! # Input Manager
//!
//! This module handles input processing for the application, including:
//! - Keyboard input state tracking
//! - Mouse input state tracking
//! - Input event processing
//! - Input state management

use std::collections::HashMap;

use super::input_state::{InputEvent, Key, MouseButton, MouseInput, ProcessedInputState, RawInputState};

/// Manages the state of all input devices and processes input events.
///
/// Events are folded into "new" down/up maps as they arrive; once per tick the maps
/// are compared with the previous tick's to produce a [`ProcessedInputState`].
#[derive(Debug)]
pub struct InputManager {
    /// Previous state of all tracked keyboard keys
    pub keyboard_inputs_old: HashMap<Key, bool>,
    /// Current state of all tracked keyboard keys
    pub keyboard_inputs_new: HashMap<Key, bool>,

    /// Current state of mouse inputs
    pub mouse_inputs: MouseInput,

    focus_regained: bool,
}

impl InputManager {
    /// Creates a new InputManager with every tracked key and button released.
    pub fn new() -> Self {
        let keyboard_inputs_old: HashMap<Key, bool> = Key::ALL.iter().map(|&key| (key, false)).collect();
        let keyboard_inputs_new = keyboard_inputs_old.clone();

        let mouse_button_inputs_old: HashMap<MouseButton, bool> =
            MouseButton::ALL.iter().map(|&button| (button, false)).collect();
        let mouse_button_inputs_new = mouse_button_inputs_old.clone();

        Self {
            keyboard_inputs_old,
            keyboard_inputs_new,
            mouse_inputs: MouseInput {
                mouse_button_inputs_old,
                mouse_button_inputs_new,
                cursor_position: None,
            },
            focus_regained: false,
        }
    }

    /// Updates the old state with the current state to prepare for the next tick.
    pub fn move_old_states(&mut self) {
        for (key, new_state) in self.keyboard_inputs_new.iter() {
            if let Some(old_state) = self.keyboard_inputs_old.get_mut(key) {
                *old_state = *new_state;
            }
        }

        for (button, new_state) in self.mouse_inputs.mouse_button_inputs_new.iter() {
            if let Some(old_state) = self.mouse_inputs.mouse_button_inputs_old.get_mut(button) {
                *old_state = *new_state;
            }
        }
    }

    /// Processes an input event and updates internal input state.
    ///
    /// Losing focus releases every key and button so nothing stays stuck down.
    pub fn intake_input(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyDown(key) => self.set_key(key, true),
            InputEvent::KeyUp(key) => self.set_key(key, false),
            InputEvent::MouseMoved { x, y } => {
                self.mouse_inputs.cursor_position = Some((x, y));
            }
            InputEvent::MouseButtonDown(button) => self.set_button(button, true),
            InputEvent::MouseButtonUp(button) => self.set_button(button, false),
            InputEvent::Focused(true) => {
                self.focus_regained = true;
            }
            InputEvent::Focused(false) => self.release_all(),
            InputEvent::Resized { .. } | InputEvent::Quit => {}
        }
    }

    fn set_key(&mut self, key: Key, down: bool) {
        if let Some(key_state) = self.keyboard_inputs_new.get_mut(&key) {
            *key_state = down;
        }
    }

    fn set_button(&mut self, button: MouseButton, down: bool) {
        if let Some(button_state) = self.mouse_inputs.mouse_button_inputs_new.get_mut(&button) {
            *button_state = down;
        }
    }

    fn release_all(&mut self) {
        self.keyboard_inputs_new.values_mut().for_each(|state| *state = false);
        self.mouse_inputs
            .mouse_button_inputs_new
            .values_mut()
            .for_each(|state| *state = false);
    }

    /// Creates a processed input state from the current raw boolean states.
    pub fn create_processed_input_state(&self) -> ProcessedInputState {
        let keyboard_states = self
            .keyboard_inputs_new
            .iter()
            .map(|(key, &new_state)| {
                let old_state = self.keyboard_inputs_old.get(key).copied().unwrap_or(false);
                (*key, RawInputState::from_raw_states(old_state, new_state))
            })
            .collect();

        let mouse_button_states = self
            .mouse_inputs
            .mouse_button_inputs_new
            .iter()
            .map(|(button, &new_state)| {
                let old_state = self
                    .mouse_inputs
                    .mouse_button_inputs_old
                    .get(button)
                    .copied()
                    .unwrap_or(false);
                (*button, RawInputState::from_raw_states(old_state, new_state))
            })
            .collect();

        ProcessedInputState {
            keyboard_states,
            mouse_button_states,
            cursor_position: self.mouse_inputs.cursor_position,
            focus_regained: self.focus_regained,
        }
    }

    /// Returns the processed input state and resets internal state for the next tick.
    pub fn get_and_reset_processed_input(&mut self) -> ProcessedInputState {
        let processed_input = self.create_processed_input_state();
        self.reset_inputs();
        processed_input
    }

    /// Rolls the current states over and clears per-tick data.
    pub fn reset_inputs(&mut self) {
        self.move_old_states();
        self.mouse_inputs.cursor_position = None;
        self.focus_regained = false;
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_goes_through_press_hold_release() {
        let mut manager = InputManager::new();

        manager.intake_input(&InputEvent::KeyDown(Key::W));
        let first = manager.get_and_reset_processed_input();
        assert_eq!(first.get_key_state(Key::W), RawInputState::Pressed);

        let second = manager.get_and_reset_processed_input();
        assert_eq!(second.get_key_state(Key::W), RawInputState::Held);

        manager.intake_input(&InputEvent::KeyUp(Key::W));
        let third = manager.get_and_reset_processed_input();
        assert_eq!(third.get_key_state(Key::W), RawInputState::Released);

        let fourth = manager.get_and_reset_processed_input();
        assert_eq!(fourth.get_key_state(Key::W), RawInputState::NotPressed);
    }

    #[test]
    fn cursor_position_lasts_one_tick() {
        let mut manager = InputManager::new();
        manager.intake_input(&InputEvent::MouseMoved { x: 1.0, y: 2.0 });
        manager.intake_input(&InputEvent::MouseMoved { x: 3.0, y: 4.0 });

        let first = manager.get_and_reset_processed_input();
        assert_eq!(first.get_cursor_position(), Some((3.0, 4.0)));
        assert_eq!(manager.get_and_reset_processed_input().get_cursor_position(), None);
    }

    #[test]
    fn losing_focus_releases_everything() {
        let mut manager = InputManager::new();
        manager.intake_input(&InputEvent::KeyDown(Key::D));
        manager.intake_input(&InputEvent::MouseButtonDown(MouseButton::Left));
        manager.get_and_reset_processed_input();

        manager.intake_input(&InputEvent::Focused(false));
        let state = manager.get_and_reset_processed_input();
        assert_eq!(state.get_key_state(Key::D), RawInputState::Released);
        assert_eq!(state.get_mouse_button_state(MouseButton::Left), RawInputState::Released);

        manager.intake_input(&InputEvent::Focused(true));
        assert!(manager.get_and_reset_processed_input().focus_regained);
        assert!(!manager.get_and_reset_processed_input().focus_regained);
    }
}
