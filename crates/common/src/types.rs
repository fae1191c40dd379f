use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One of the two players. The left player owns the left half of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Both sides in evaluation order.
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn opponent(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// What one player wants to do this frame.
///
/// Produced by the input layer from held keys; `fire` is already resolved
/// against the configured fire mode, so the simulation spawns exactly one
/// projectile per `fire == true` frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub forward: bool,
    pub back: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub fire: bool,
}

impl Intent {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Net forward/back direction: +1, -1 or 0 when both or neither are held.
    pub fn thrust(&self) -> f32 {
        match (self.forward, self.back) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }

    /// Net turn direction: +1 for left, -1 for right, 0 otherwise.
    pub fn turn(&self) -> f32 {
        match (self.turn_left, self.turn_right) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }
}

/// Intents for both players for a single simulation step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInput {
    pub left: Intent,
    pub right: Intent,
}

impl FrameInput {
    pub fn new(left: Intent, right: Intent) -> Self {
        Self { left, right }
    }

    pub fn side(&self, side: Side) -> &Intent {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut Intent {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// Unit vector on the ground plane for a yaw heading: `(sin h, 0, cos h)`.
pub fn heading_forward(heading: f32) -> Vec3 {
    Vec3::new(heading.sin(), 0.0, heading.cos())
}
