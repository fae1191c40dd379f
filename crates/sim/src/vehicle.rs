use arena_common::heading_forward;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::config::VehicleStart;

/// Continuous state of one vehicle: ground position and yaw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub position: Vec3,
    /// Yaw in radians, kept in `[0, 2π)`.
    pub heading_y: f32,
}

impl Vehicle {
    pub fn new(position: Vec3, heading_y: f32) -> Self {
        Self {
            position,
            heading_y: heading_y.rem_euclid(TAU),
        }
    }

    pub fn from_start(start: VehicleStart) -> Self {
        Self::new(start.position, start.heading)
    }

    /// Unit direction the vehicle drives in.
    pub fn forward(&self) -> Vec3 {
        heading_forward(self.heading_y)
    }

    pub fn turn(&mut self, delta: f32) {
        self.heading_y = (self.heading_y + delta).rem_euclid(TAU);
    }

    /// Clamp X and Z independently to `[-bound, bound]`. Returns whether the
    /// position changed.
    pub fn clamp_to(&mut self, bound: f32) -> bool {
        let clamped = Vec3::new(
            self.position.x.clamp(-bound, bound),
            self.position.y,
            self.position.z.clamp(-bound, bound),
        );
        let changed = clamped != self.position;
        self.position = clamped;
        changed
    }

    pub fn within(&self, bound: f32) -> bool {
        self.position.x.abs() <= bound && self.position.z.abs() <= bound
    }

    /// World transform: yaw about +Y, then translation.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_rotation_y(self.heading_y)
    }
}
