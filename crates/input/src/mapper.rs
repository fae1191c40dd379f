use arena_common::{FrameInput, Intent, Side};
use serde::{Deserialize, Serialize};

use crate::keys::{Key, KeySource};

/// How a held fire key turns into `Intent::fire`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FireMode {
    /// Fire once on the frame the key goes down.
    #[default]
    Edge,
    /// Fire on every frame the key reads as down (no debounce).
    Held,
}

/// Key assignment for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideBindings {
    pub forward: Key,
    pub back: Key,
    pub turn_left: Key,
    pub turn_right: Key,
    pub fire: Key,
}

/// Key assignment for both players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    pub left: SideBindings,
    pub right: SideBindings,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            left: SideBindings {
                forward: Key::W,
                back: Key::S,
                turn_left: Key::A,
                turn_right: Key::D,
                fire: Key::Space,
            },
            right: SideBindings {
                forward: Key::ArrowUp,
                back: Key::ArrowDown,
                turn_left: Key::ArrowLeft,
                turn_right: Key::ArrowRight,
                fire: Key::ShiftRight,
            },
        }
    }
}

impl Bindings {
    pub fn side(&self, side: Side) -> &SideBindings {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

/// Serializable input settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub fire_mode: FireMode,
    pub bindings: Bindings,
}

/// Polls a `KeySource` and produces the intents for one simulation step.
///
/// Keeps the previous fire state per side so `FireMode::Edge` can detect the
/// key-down transition.
#[derive(Debug, Clone)]
pub struct InputMapper {
    config: InputConfig,
    fire_was_down: [bool; 2],
}

impl InputMapper {
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            fire_was_down: [false; 2],
        }
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    pub fn set_fire_mode(&mut self, mode: FireMode) {
        self.config.fire_mode = mode;
    }

    /// Poll every bound key once and build this step's `FrameInput`.
    pub fn poll(&mut self, keys: &impl KeySource) -> FrameInput {
        let mut input = FrameInput::default();
        for side in Side::BOTH {
            *input.side_mut(side) = self.poll_side(side, keys);
        }
        input
    }

    fn poll_side(&mut self, side: Side, keys: &impl KeySource) -> Intent {
        let bindings = *self.config.bindings.side(side);
        let fire_down = keys.is_key_down(bindings.fire);
        let was_down = std::mem::replace(&mut self.fire_was_down[side.index()], fire_down);
        let fire = match self.config.fire_mode {
            FireMode::Edge => fire_down && !was_down,
            FireMode::Held => fire_down,
        };
        if fire {
            tracing::trace!(side = side.label(), "fire");
        }
        Intent {
            forward: keys.is_key_down(bindings.forward),
            back: keys.is_key_down(bindings.back),
            turn_left: keys.is_key_down(bindings.turn_left),
            turn_right: keys.is_key_down(bindings.turn_right),
            fire,
        }
    }
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyboardState;

    #[test]
    fn default_bindings_split_the_keyboard() {
        let mut keys = KeyboardState::new();
        keys.press(Key::W);
        keys.press(Key::ArrowLeft);
        let input = InputMapper::default().poll(&keys);
        assert!(input.left.forward);
        assert!(!input.left.turn_left);
        assert!(input.right.turn_left);
        assert!(!input.right.forward);
    }

    #[test]
    fn edge_mode_fires_once_per_press() {
        let mut keys = KeyboardState::new();
        let mut mapper = InputMapper::default();
        keys.press(Key::Space);
        let fired: Vec<bool> = (0..5).map(|_| mapper.poll(&keys).left.fire).collect();
        assert_eq!(fired, vec![true, false, false, false, false]);

        keys.release(Key::Space);
        assert!(!mapper.poll(&keys).left.fire);
        keys.press(Key::Space);
        assert!(mapper.poll(&keys).left.fire);
    }

    #[test]
    fn held_mode_fires_every_frame() {
        let mut keys = KeyboardState::new();
        let mut mapper = InputMapper::new(InputConfig {
            fire_mode: FireMode::Held,
            ..InputConfig::default()
        });
        keys.press(Key::ShiftRight);
        let count = (0..4).filter(|_| mapper.poll(&keys).right.fire).count();
        assert_eq!(count, 4);
    }

    #[test]
    fn sides_track_fire_edges_independently() {
        let mut keys = KeyboardState::new();
        let mut mapper = InputMapper::default();
        keys.press(Key::Space);
        assert!(mapper.poll(&keys).left.fire);
        keys.press(Key::ShiftRight);
        let input = mapper.poll(&keys);
        assert!(!input.left.fire);
        assert!(input.right.fire);
    }

    #[test]
    fn input_config_parses_from_json() {
        let config: InputConfig = serde_json::from_str(r#"{ "fire_mode": "held" }"#).unwrap();
        assert_eq!(config.fire_mode, FireMode::Held);
        assert_eq!(config.bindings, Bindings::default());
    }
}
