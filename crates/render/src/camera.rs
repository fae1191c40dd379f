use arena_common::heading_forward;
use arena_sim::Vehicle;
use glam::{Mat4, Vec3};

/// Lens of a camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        /// Vertical field of view in radians.
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        half_height: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    pub fn perspective(fov_y: f32, aspect: f32) -> Self {
        Self::Perspective {
            fov_y,
            aspect,
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn set_aspect(&mut self, value: f32) {
        match self {
            Self::Perspective { aspect, .. } | Self::Orthographic { aspect, .. } => *aspect = value,
        }
    }

    pub fn aspect(&self) -> f32 {
        match *self {
            Self::Perspective { aspect, .. } | Self::Orthographic { aspect, .. } => aspect,
        }
    }

    /// Clip-space depth in `[0, 1]`.
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Self::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov_y, aspect, near, far),
            Self::Orthographic {
                half_height,
                aspect,
                near,
                far,
            } => {
                let half_width = half_height * aspect;
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    near,
                    far,
                )
            }
        }
    }
}

/// Position, look direction and lens. Produces the matrices the light
/// passes upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Look direction; need not be normalized.
    pub direction: Vec3,
    pub up: Vec3,
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 10.0, 15.0),
            direction: Vec3::new(0.0, -10.0, -15.0),
            up: Vec3::Y,
            projection: Projection::perspective(60.0_f32.to_radians(), 16.0 / 9.0),
        }
    }
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4 {
        let direction = self.direction.try_normalize().unwrap_or(Vec3::NEG_Z);
        Mat4::look_to_rh(self.position, direction, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Trailing camera placement for a vehicle: behind by `distance` along the
/// heading and raised by `height`, looking along the heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaseRig {
    pub distance: f32,
    pub height: f32,
    pub fov_y: f32,
}

impl Default for ChaseRig {
    fn default() -> Self {
        Self {
            distance: 5.0,
            height: 5.0,
            fov_y: 60.0_f32.to_radians(),
        }
    }
}

impl ChaseRig {
    /// Fresh camera for `vehicle` with the given viewport aspect.
    pub fn camera(&self, vehicle: &Vehicle, aspect: f32) -> Camera {
        let mut camera = Camera {
            projection: Projection::perspective(self.fov_y, aspect),
            ..Camera::default()
        };
        self.follow(&mut camera, vehicle);
        camera
    }

    /// Re-place an existing camera, keeping its projection.
    ///
    /// The look direction is the horizontal heading. Vehicles never leave the
    /// ground plane, so this matches a direction built from the vehicle height.
    pub fn follow(&self, camera: &mut Camera, vehicle: &Vehicle) {
        let forward = heading_forward(vehicle.heading_y);
        camera.position = vehicle.position - forward * self.distance + Vec3::Y * self.height;
        camera.direction = forward;
        camera.up = Vec3::Y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chase_camera_trails_vehicle() {
        let vehicle = Vehicle::new(Vec3::new(0.0, 0.0, -10.0), 0.0);
        let camera = ChaseRig::default().camera(&vehicle, 1.0);
        assert!((camera.position - Vec3::new(0.0, 5.0, -15.0)).length() < 1e-6);
        assert!((camera.direction - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn chase_camera_follows_heading() {
        let vehicle = Vehicle::new(Vec3::new(3.0, 0.0, 4.0), std::f32::consts::FRAC_PI_2);
        let camera = ChaseRig::default().camera(&vehicle, 1.0);
        assert!((camera.position - Vec3::new(-2.0, 5.0, 4.0)).length() < 1e-5);
        assert!((camera.direction - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn vehicle_ahead_projects_to_screen_center_column() {
        let vehicle = Vehicle::new(Vec3::new(1.0, 0.0, 2.0), 0.4);
        let camera = ChaseRig::default().camera(&vehicle, 640.0 / 720.0);
        let clip = camera.view_projection() * (vehicle.position + vehicle.forward() * 20.0).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(clip.w > 0.0);
        assert!(ndc.x.abs() < 1e-4);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn orthographic_maps_half_height_to_edge() {
        let camera = Camera {
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            up: Vec3::Y,
            projection: Projection::Orthographic {
                half_height: 10.0,
                aspect: 2.0,
                near: 0.1,
                far: 100.0,
            },
        };
        let edge = camera.view_projection().project_point3(Vec3::new(20.0, 10.0, -5.0));
        assert!((edge.x - 1.0).abs() < 1e-5);
        assert!((edge.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn set_aspect_keeps_lens() {
        let mut projection = Projection::perspective(1.0, 1.0);
        projection.set_aspect(0.5);
        assert_eq!(projection.aspect(), 0.5);
        assert!(!projection.matrix().is_nan());
    }
}
