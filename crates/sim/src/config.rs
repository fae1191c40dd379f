//! Simulation tuning and session configuration.
//!
//! All motion values are rates per second. The defaults are the per-frame
//! constants the arena was tuned with, multiplied by 60.

use arena_input::InputConfig;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Step size the defaults were tuned for.
pub const FIXED_DT: f32 = 1.0 / 60.0;

const TUNED_MOVE_PER_FRAME: f32 = 0.135;
const TUNED_TURN_PER_FRAME: f32 = 0.035;
const TUNED_PROJECTILE_PER_FRAME: f32 = 0.5;

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Arena size presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArenaPreset {
    /// Half-extent 20.
    Small,
    /// Half-extent 97.5.
    Large,
}

impl ArenaPreset {
    pub fn bound(self) -> f32 {
        match self {
            Self::Small => 20.0,
            Self::Large => 97.5,
        }
    }
}

/// Where a fired projectile appears.
///
/// `Opponent` is the observed behaviour of the arena as it was tuned: the
/// projectile spawns at the *other* vehicle. `Firer` spawns it at the vehicle
/// that fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnOrigin {
    #[default]
    Opponent,
    Firer,
}

/// Lifetime policy of the projectile list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ProjectilePolicy {
    /// Never remove anything; the list grows for the whole session.
    Unbounded,
    /// Drop projectiles older than `max_age_secs`, far outside the arena, or
    /// beyond `capacity` (oldest first).
    Bounded { max_age_secs: f32, capacity: usize },
}

impl Default for ProjectilePolicy {
    fn default() -> Self {
        Self::Bounded {
            max_age_secs: 4.0,
            capacity: 256,
        }
    }
}

/// Initial placement of one vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleStart {
    pub position: Vec3,
    pub heading: f32,
}

/// Tuning for `Simulation::step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Vehicle speed, world units per second.
    pub move_speed: f32,
    /// Vehicle turn rate, radians per second.
    pub turn_rate: f32,
    /// Projectile speed, world units per second.
    pub projectile_speed: f32,
    /// Separation below which closing moves are blocked.
    pub collision_threshold: f32,
    /// Half-extent of the square arena on X and Z.
    pub arena_bound: f32,
    pub spawn_origin: SpawnOrigin,
    pub projectile_policy: ProjectilePolicy,
    pub left_start: VehicleStart,
    pub right_start: VehicleStart,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            move_speed: TUNED_MOVE_PER_FRAME / FIXED_DT,
            turn_rate: TUNED_TURN_PER_FRAME / FIXED_DT,
            projectile_speed: TUNED_PROJECTILE_PER_FRAME / FIXED_DT,
            collision_threshold: 5.0,
            arena_bound: ArenaPreset::Small.bound(),
            spawn_origin: SpawnOrigin::default(),
            projectile_policy: ProjectilePolicy::default(),
            left_start: VehicleStart {
                position: Vec3::new(0.0, 0.0, -10.0),
                heading: 0.0,
            },
            right_start: VehicleStart {
                position: Vec3::new(0.0, 0.0, 10.0),
                heading: std::f32::consts::PI,
            },
        }
    }
}

impl SimConfig {
    pub fn for_arena(preset: ArenaPreset) -> Self {
        Self {
            arena_bound: preset.bound(),
            ..Self::default()
        }
    }

    /// Reject values that would make the step meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("move_speed", self.move_speed),
            ("turn_rate", self.turn_rate),
            ("projectile_speed", self.projectile_speed),
            ("arena_bound", self.arena_bound),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(self.collision_threshold.is_finite() && self.collision_threshold >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "collision_threshold must be non-negative, got {}",
                self.collision_threshold
            )));
        }
        if let ProjectilePolicy::Bounded {
            max_age_secs,
            capacity,
        } = self.projectile_policy
        {
            if capacity == 0 {
                return Err(ConfigError::Invalid(
                    "projectile capacity must be at least 1".into(),
                ));
            }
            if !(max_age_secs.is_finite() && max_age_secs > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "projectile max_age_secs must be positive, got {max_age_secs}"
                )));
            }
        }
        Ok(())
    }
}

/// Everything a session needs: simulation tuning plus input settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub sim: SimConfig,
    pub input: InputConfig,
}

impl GameConfig {
    /// Load and validate a JSON configuration file. Missing fields take
    /// their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path.as_ref())?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.sim.validate()?;
        tracing::debug!(path = %path.as_ref().display(), "loaded game config");
        Ok(config)
    }

    /// Write the configuration as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
