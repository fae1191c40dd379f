use arena_common::{Side, heading_forward};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::ProjectilePolicy;

/// One live projectile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// World transform; the translation column is the current position.
    pub model: Mat4,
    pub heading_y: f32,
    /// Side that fired it. Not used for drawing.
    pub owner: Side,
    /// Seconds since spawn.
    pub age: f32,
}

impl Projectile {
    pub fn spawn(position: Vec3, heading_y: f32, owner: Side) -> Self {
        Self {
            model: Mat4::from_translation(position),
            heading_y,
            owner,
            age: 0.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.model.w_axis.truncate()
    }

    /// Translate along the heading by `distance` and age by `dt`.
    pub fn advance(&mut self, distance: f32, dt: f32) {
        self.model = Mat4::from_translation(heading_forward(self.heading_y) * distance) * self.model;
        self.age += dt;
    }
}

/// Ordered list of live projectiles; new ones are appended at the end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectileList {
    items: Vec<Projectile>,
    policy: ProjectilePolicy,
    total_spawned: u64,
}

impl ProjectileList {
    pub fn new(policy: ProjectilePolicy) -> Self {
        Self {
            items: Vec::new(),
            policy,
            total_spawned: 0,
        }
    }

    pub fn policy(&self) -> ProjectilePolicy {
        self.policy
    }

    pub fn push(&mut self, projectile: Projectile) {
        self.items.push(projectile);
        self.total_spawned += 1;
    }

    /// Move every projectile once.
    pub fn advance_all(&mut self, speed: f32, dt: f32) {
        let distance = speed * dt;
        for projectile in &mut self.items {
            projectile.advance(distance, dt);
        }
    }

    /// Apply the lifetime policy. Returns how many projectiles were removed.
    pub fn enforce(&mut self, arena_bound: f32) -> usize {
        let ProjectilePolicy::Bounded {
            max_age_secs,
            capacity,
        } = self.policy
        else {
            return 0;
        };

        let before = self.items.len();
        let cull = arena_bound * 2.0;
        self.items.retain(|p| {
            let pos = p.position();
            p.age <= max_age_secs && pos.x.abs() <= cull && pos.z.abs() <= cull
        });
        if self.items.len() > capacity {
            let excess = self.items.len() - capacity;
            self.items.drain(..excess);
        }
        before - self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Projectile] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.items.iter()
    }

    /// Projectiles ever appended, including removed ones.
    pub fn total_spawned(&self) -> u64 {
        self.total_spawned
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounded(max_age_secs: f32, capacity: usize) -> ProjectilePolicy {
        ProjectilePolicy::Bounded {
            max_age_secs,
            capacity,
        }
    }

    #[test]
    fn advance_moves_along_heading() {
        let mut p = Projectile::spawn(Vec3::new(1.0, 0.0, 1.0), 0.0, Side::Left);
        p.advance(2.0, 0.1);
        assert!((p.position() - Vec3::new(1.0, 0.0, 3.0)).length() < 1e-6);
        assert!((p.age - 0.1).abs() < 1e-6);
    }

    #[test]
    fn unbounded_never_removes() {
        let mut list = ProjectileList::new(ProjectilePolicy::Unbounded);
        for _ in 0..10 {
            list.push(Projectile::spawn(Vec3::ZERO, 0.0, Side::Right));
        }
        list.advance_all(1000.0, 10.0);
        assert_eq!(list.enforce(20.0), 0);
        assert_eq!(list.len(), 10);
    }

    #[test]
    fn bounded_drops_old_projectiles() {
        let mut list = ProjectileList::new(bounded(1.0, 100));
        list.push(Projectile::spawn(Vec3::ZERO, 0.0, Side::Left));
        list.advance_all(0.0, 0.6);
        list.push(Projectile::spawn(Vec3::ZERO, 0.0, Side::Left));
        list.advance_all(0.0, 0.6);
        assert_eq!(list.enforce(20.0), 1);
        assert_eq!(list.len(), 1);
        assert_eq!(list.total_spawned(), 2);
    }

    #[test]
    fn bounded_culls_far_outside_arena() {
        let mut list = ProjectileList::new(bounded(100.0, 100));
        list.push(Projectile::spawn(Vec3::new(0.0, 0.0, 39.0), 0.0, Side::Left));
        list.push(Projectile::spawn(Vec3::new(0.0, 0.0, 41.0), 0.0, Side::Left));
        assert_eq!(list.enforce(20.0), 1);
        assert_eq!(list.as_slice()[0].position().z, 39.0);
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut list = ProjectileList::new(bounded(100.0, 3));
        for i in 0..5 {
            list.push(Projectile::spawn(Vec3::new(i as f32, 0.0, 0.0), 0.0, Side::Left));
        }
        assert_eq!(list.enforce(20.0), 2);
        let xs: Vec<f32> = list.iter().map(|p| p.position().x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }
}
