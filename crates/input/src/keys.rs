use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Logical keys the arena polls. Platform layers translate their own key
/// codes into these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    ShiftRight,
    ShiftLeft,
    ControlRight,
    Enter,
}

/// The key-down query service: answers whether a key is held right now.
pub trait KeySource {
    fn is_key_down(&self, key: Key) -> bool;
}

/// Held-key set fed by press/release events from the window layer.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    held: HashSet<Key>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    /// Apply a press (`true`) or release (`false`) event.
    pub fn set(&mut self, key: Key, down: bool) {
        if down {
            self.press(key);
        } else {
            self.release(key);
        }
    }

    /// Forget every held key, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }
}

impl KeySource for KeyboardState {
    fn is_key_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }
}
