//! Duel simulation: two vehicles, one arena, a list of projectiles.
//!
//! # Invariants
//! - After every step each vehicle satisfies `|x| <= bound` and `|z| <= bound`.
//! - A forward/back move that would shrink the separation of two vehicles
//!   already closer than the collision threshold is reverted.
//! - Projectiles are advanced exactly once per step, here and nowhere else.
//! - Motion is `rate * dt`; the defaults reproduce the tuned 60 Hz values.

pub mod config;
pub mod projectile;
pub mod vehicle;
pub mod world;

pub use config::{
    ArenaPreset, ConfigError, FIXED_DT, GameConfig, ProjectilePolicy, SimConfig, SpawnOrigin,
    VehicleStart,
};
pub use projectile::{Projectile, ProjectileList};
pub use vehicle::Vehicle;
pub use world::{SimEvent, Simulation};

pub fn crate_info() -> &'static str {
    "arena-sim v0.1.0"
}
