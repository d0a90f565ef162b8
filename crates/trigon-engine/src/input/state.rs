use std::collections::HashSet;

use super::types::{InputEvent, Key, KeyState};

/// Held-key state for the window.
#[derive(Debug, Default)]
pub struct InputState {
    keys_down: HashSet<Key>,
}

impl InputState {
    pub fn apply_event(&mut self, ev: InputEvent) {
        match ev {
            InputEvent::Key { key, state, .. } => match state {
                KeyState::Pressed => {
                    self.keys_down.insert(key);
                }
                KeyState::Released => {
                    self.keys_down.remove(&key);
                }
            },

            // The release will be delivered to whoever has focus now.
            InputEvent::Focused(false) => self.keys_down.clear(),
            InputEvent::Focused(true) => {}
        }
    }

    pub fn key_state(&self, key: Key) -> KeyState {
        if self.key_down(key) {
            KeyState::Pressed
        } else {
            KeyState::Released
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }
}
