use arena_common::{FrameInput, Intent, Side};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::{SimConfig, SpawnOrigin};
use crate::projectile::{Projectile, ProjectileList};
use crate::vehicle::Vehicle;

/// A record of something noteworthy that happened during a step.
///
/// The log is append-only until drained; the desktop HUD and the CLI read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// A projectile was appended to the list.
    Fired {
        tick: u64,
        owner: Side,
        origin: Vec3,
    },
    /// A closing move was reverted by the approach-blocking heuristic.
    Blocked { tick: u64, side: Side, separation: f32 },
    /// A vehicle was pushed back inside the arena.
    Clamped { tick: u64, side: Side },
    /// The lifetime policy removed projectiles.
    Expired { tick: u64, count: usize },
}

/// The duel state: two vehicles and the projectiles they fired.
///
/// All mutation goes through `step`. Rendering only reads.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    vehicles: [Vehicle; 2],
    projectiles: ProjectileList,
    tick: u64,
    events: Vec<SimEvent>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        let vehicles = [
            Vehicle::from_start(config.left_start),
            Vehicle::from_start(config.right_start),
        ];
        let projectiles = ProjectileList::new(config.projectile_policy);
        Self {
            config,
            vehicles,
            projectiles,
            tick: 0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn vehicle(&self, side: Side) -> &Vehicle {
        &self.vehicles[side.index()]
    }

    /// Direct placement, for scenario setup.
    pub fn vehicle_mut(&mut self, side: Side) -> &mut Vehicle {
        &mut self.vehicles[side.index()]
    }

    pub fn projectiles(&self) -> &ProjectileList {
        &self.projectiles
    }

    /// Number of completed steps.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Distance between the two vehicles.
    pub fn separation(&self) -> f32 {
        self.vehicles[0].position.distance(self.vehicles[1].position)
    }

    /// Restore the starting placement and drop every projectile.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
        tracing::info!("simulation reset");
    }

    /// Advance the duel by one step of `dt` seconds.
    ///
    /// Order: existing projectiles fly, each vehicle turns and drives (left
    /// first), fire intents append projectiles, then the lifetime policy runs.
    pub fn step(&mut self, input: &FrameInput, dt: f32) {
        self.tick += 1;
        self.projectiles.advance_all(self.config.projectile_speed, dt);

        for side in Side::BOTH {
            self.drive(side, input.side(side), dt);
        }
        for side in Side::BOTH {
            if input.side(side).fire {
                self.fire(side);
            }
        }

        let removed = self.projectiles.enforce(self.config.arena_bound);
        if removed > 0 {
            self.events.push(SimEvent::Expired {
                tick: self.tick,
                count: removed,
            });
        }
    }

    fn drive(&mut self, side: Side, intent: &Intent, dt: f32) {
        let index = side.index();
        let turn = intent.turn();
        if turn != 0.0 {
            self.vehicles[index].turn(turn * self.config.turn_rate * dt);
        }

        let thrust = intent.thrust();
        if thrust != 0.0 {
            let before = self.separation();
            let previous = self.vehicles[index].position;
            let delta = self.vehicles[index].forward() * (thrust * self.config.move_speed * dt);
            self.vehicles[index].position += delta;

            let after = self.separation();
            if before < self.config.collision_threshold && after < before {
                self.vehicles[index].position = previous;
                tracing::trace!(side = side.label(), before, after, "closing move blocked");
                self.events.push(SimEvent::Blocked {
                    tick: self.tick,
                    side,
                    separation: before,
                });
            }
        }

        if self.vehicles[index].clamp_to(self.config.arena_bound) {
            self.events.push(SimEvent::Clamped {
                tick: self.tick,
                side,
            });
        }
    }

    fn fire(&mut self, side: Side) {
        let firer = self.vehicles[side.index()];
        let origin = match self.config.spawn_origin {
            SpawnOrigin::Opponent => self.vehicles[side.opponent().index()].position,
            SpawnOrigin::Firer => firer.position,
        };
        self.projectiles
            .push(Projectile::spawn(origin, firer.heading_y, side));
        tracing::debug!(
            side = side.label(),
            live = self.projectiles.len(),
            "projectile fired"
        );
        self.events.push(SimEvent::Fired {
            tick: self.tick,
            owner: side,
            origin,
        });
    }

    /// Deterministic hash of vehicle and projectile state, for comparing runs.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        for vehicle in &self.vehicles {
            for value in vehicle.position.to_array() {
                mix(&mut h, &value.to_le_bytes());
            }
            mix(&mut h, &vehicle.heading_y.to_le_bytes());
        }
        for projectile in self.projectiles.iter() {
            for value in projectile.position().to_array() {
                mix(&mut h, &value.to_le_bytes());
            }
            mix(&mut h, &[projectile.owner.index() as u8]);
        }
        h
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FIXED_DT, ProjectilePolicy};
    use std::f32::consts::TAU;

    fn unbounded() -> SimConfig {
        SimConfig {
            projectile_policy: ProjectilePolicy::Unbounded,
            ..SimConfig::default()
        }
    }

    fn only(side: Side, intent: Intent) -> FrameInput {
        let mut input = FrameInput::default();
        *input.side_mut(side) = intent;
        input
    }

    fn forward() -> Intent {
        Intent {
            forward: true,
            ..Intent::idle()
        }
    }

    fn angle_close(a: f32, b: f32) -> bool {
        let d = (a - b).rem_euclid(TAU);
        d < 1e-3 || TAU - d < 1e-3
    }

    #[test]
    fn starts_at_configured_positions() {
        let sim = Simulation::default();
        assert_eq!(sim.vehicle(Side::Left).position, Vec3::new(0.0, 0.0, -10.0));
        assert_eq!(sim.vehicle(Side::Right).position, Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(sim.tick(), 0);
        assert!(sim.projectiles().is_empty());
    }

    #[test]
    fn forward_moves_tuned_distance_per_step() {
        let mut sim = Simulation::default();
        sim.step(&only(Side::Left, forward()), FIXED_DT);
        let z = sim.vehicle(Side::Left).position.z;
        assert!((z - (-10.0 + 0.135)).abs() < 1e-5);
    }

    #[test]
    fn turn_accumulates_per_step() {
        let mut sim = Simulation::default();
        sim.vehicle_mut(Side::Left).position = Vec3::new(7.0, 0.0, 3.0);
        let start = sim.vehicle(Side::Left).heading_y;
        let turn_left = Intent {
            turn_left: true,
            ..Intent::idle()
        };
        for n in 1..=200u32 {
            sim.step(&only(Side::Left, turn_left), FIXED_DT);
            let expected = start + n as f32 * 0.035;
            assert!(
                angle_close(sim.vehicle(Side::Left).heading_y, expected),
                "step {n}: {} vs {expected}",
                sim.vehicle(Side::Left).heading_y
            );
        }
        assert_eq!(sim.vehicle(Side::Left).position, Vec3::new(7.0, 0.0, 3.0));
    }

    #[test]
    fn bounds_hold_for_any_drive_pattern() {
        let mut sim = Simulation::default();
        let bound = sim.config().arena_bound;
        for step in 0..3000u32 {
            let left = Intent {
                forward: step % 7 != 0,
                back: step % 11 == 0,
                turn_left: (step / 150) % 3 == 0,
                turn_right: (step / 90) % 4 == 1,
                fire: false,
            };
            let right = Intent {
                forward: (step / 40) % 2 == 0,
                back: (step / 40) % 2 == 1,
                turn_right: step % 5 == 0,
                ..Intent::idle()
            };
            sim.step(&FrameInput::new(left, right), FIXED_DT);
            for side in Side::BOTH {
                assert!(sim.vehicle(side).within(bound), "step {step}: {side:?} escaped");
            }
        }
    }

    #[test]
    fn driving_into_the_wall_clamps() {
        let mut sim = Simulation::default();
        sim.vehicle_mut(Side::Right).position = Vec3::new(19.95, 0.0, 0.0);
        sim.vehicle_mut(Side::Right).heading_y = std::f32::consts::FRAC_PI_2;
        sim.step(&only(Side::Right, forward()), FIXED_DT);
        assert_eq!(sim.vehicle(Side::Right).position.x, 20.0);
        assert!(
            sim.events()
                .iter()
                .any(|e| matches!(e, SimEvent::Clamped { side: Side::Right, .. }))
        );
    }

    #[test]
    fn closing_move_inside_threshold_is_reverted() {
        let mut sim = Simulation::default();
        sim.vehicle_mut(Side::Left).position = Vec3::new(0.0, 0.0, -2.0);
        sim.vehicle_mut(Side::Right).position = Vec3::new(0.0, 0.0, 2.0);
        let before = sim.separation();
        sim.step(&only(Side::Left, forward()), FIXED_DT);
        assert_eq!(sim.separation(), before);
        assert_eq!(sim.vehicle(Side::Left).position, Vec3::new(0.0, 0.0, -2.0));
        assert!(matches!(sim.events()[0], SimEvent::Blocked { side: Side::Left, .. }));
    }

    #[test]
    fn retreat_inside_threshold_is_allowed() {
        let mut sim = Simulation::default();
        sim.vehicle_mut(Side::Left).position = Vec3::new(0.0, 0.0, -2.0);
        sim.vehicle_mut(Side::Right).position = Vec3::new(0.0, 0.0, 2.0);
        let back = Intent {
            back: true,
            ..Intent::idle()
        };
        let before = sim.separation();
        sim.step(&only(Side::Left, back), FIXED_DT);
        assert!(sim.separation() > before);
    }

    #[test]
    fn closing_is_free_outside_threshold() {
        let mut sim = Simulation::default();
        let before = sim.separation();
        assert!(before > 5.0);
        sim.step(&only(Side::Left, forward()), FIXED_DT);
        assert!(sim.separation() < before);
    }

    #[test]
    fn separation_never_shrinks_inside_threshold() {
        for start in 0..24 {
            let angle = start as f32 * TAU / 24.0;
            let mut sim = Simulation::default();
            sim.vehicle_mut(Side::Left).position = Vec3::ZERO;
            sim.vehicle_mut(Side::Right).position = Vec3::new(angle.sin(), 0.0, angle.cos()) * 4.0;
            for step in 0..120u32 {
                let wander = Intent {
                    forward: true,
                    turn_left: step % 3 == 0,
                    ..Intent::idle()
                };
                let before = sim.separation();
                sim.step(&only(Side::Left, wander), FIXED_DT);
                if before < sim.config().collision_threshold {
                    assert!(
                        sim.separation() >= before - 1e-5,
                        "start {start} step {step}: {before} -> {}",
                        sim.separation()
                    );
                }
            }
        }
    }

    #[test]
    fn straight_line_fire_spawns_at_opponent() {
        let mut sim = Simulation::new(unbounded());
        sim.vehicle_mut(Side::Left).position = Vec3::new(0.0, 0.0, -10.0);
        sim.vehicle_mut(Side::Left).heading_y = 0.0;
        let opponent = sim.vehicle(Side::Right).position;

        let fire = Intent {
            fire: true,
            ..Intent::idle()
        };
        sim.step(&only(Side::Left, fire), FIXED_DT);

        let projectile = sim.projectiles().as_slice()[0];
        assert_eq!(projectile.heading_y, 0.0);
        assert_eq!(projectile.owner, Side::Left);
        assert_eq!(projectile.model.w_axis.truncate(), opponent);
    }

    #[test]
    fn firer_origin_spawns_at_own_position() {
        let mut sim = Simulation::new(SimConfig {
            spawn_origin: SpawnOrigin::Firer,
            ..unbounded()
        });
        let fire = Intent {
            fire: true,
            ..Intent::idle()
        };
        sim.step(&only(Side::Right, fire), FIXED_DT);
        let projectile = sim.projectiles().as_slice()[0];
        assert_eq!(projectile.position(), sim.vehicle(Side::Right).position);
        assert_eq!(projectile.heading_y, sim.vehicle(Side::Right).heading_y);
    }

    #[test]
    fn projectiles_advance_once_per_step() {
        let mut sim = Simulation::new(unbounded());
        let fire = Intent {
            fire: true,
            ..Intent::idle()
        };
        sim.step(&only(Side::Left, fire), FIXED_DT);
        let spawned = sim.projectiles().as_slice()[0].position();
        sim.step(&FrameInput::default(), FIXED_DT);
        sim.step(&FrameInput::default(), FIXED_DT);
        let moved = sim.projectiles().as_slice()[0].position();
        assert!((moved.distance(spawned) - 2.0 * 0.5).abs() < 1e-4);
    }

    #[test]
    fn unbounded_list_grows_by_fire_count() {
        let mut sim = Simulation::new(unbounded());
        let initial = sim.projectiles().len();
        let mut fires = 0;
        for step in 0..500u32 {
            let left = Intent {
                fire: step % 3 == 0,
                ..Intent::idle()
            };
            let right = Intent {
                fire: step % 7 == 0,
                ..Intent::idle()
            };
            fires += left.fire as usize + right.fire as usize;
            sim.step(&FrameInput::new(left, right), FIXED_DT);
        }
        assert_eq!(sim.projectiles().len(), initial + fires);
    }

    #[test]
    fn bounded_policy_expires_projectiles() {
        let mut sim = Simulation::default();
        let fire = Intent {
            fire: true,
            ..Intent::idle()
        };
        sim.step(&only(Side::Left, fire), FIXED_DT);
        for _ in 0..600 {
            sim.step(&FrameInput::default(), FIXED_DT);
        }
        assert!(sim.projectiles().is_empty());
        assert_eq!(sim.projectiles().total_spawned(), 1);
        assert!(
            sim.events()
                .iter()
                .any(|e| matches!(e, SimEvent::Expired { count: 1, .. }))
        );
    }

    #[test]
    fn identical_inputs_give_identical_hash() {
        let run = || {
            let mut sim = Simulation::default();
            for step in 0..240u32 {
                let intent = Intent {
                    forward: true,
                    turn_right: step % 4 == 0,
                    fire: step % 30 == 0,
                    ..Intent::idle()
                };
                sim.step(&FrameInput::new(intent, Intent::idle()), FIXED_DT);
            }
            sim.state_hash()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn reset_restores_start() {
        let mut sim = Simulation::default();
        sim.step(&only(Side::Left, forward()), FIXED_DT);
        sim.reset();
        assert_eq!(sim.tick(), 0);
        assert_eq!(sim.vehicle(Side::Left).position, Vec3::new(0.0, 0.0, -10.0));
        assert!(sim.events().is_empty());
    }
}
