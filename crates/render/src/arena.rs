//! The duel arena as a scene: ground, two vehicles, the projectile archetype
//! and the four-light rig both front ends share.

use arena_common::Side;
use arena_sim::Simulation;
use glam::{Mat4, Vec3, Vec4};

use crate::camera::ChaseRig;
use crate::device::MeshHandle;
use crate::light::{Attenuation, Light};
use crate::material::Material;
use crate::renderer::SplitView;
use crate::scene::{ObjectId, ProjectileArchetype, Scene, SceneObject};
use crate::viewport::split_horizontal;

/// Ground texture repeats per arena side.
const GROUND_TILING: f32 = 8.0;

/// Vehicle meshes are centered on their origin; the floor sits below them.
const GROUND_LEVEL: f32 = -0.5;

/// Backend resources the arena scene is assembled from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaAssets {
    pub ground_mesh: MeshHandle,
    pub ground_material: Material,
    pub vehicle_mesh: MeshHandle,
    /// Indexed by `Side::index`.
    pub vehicle_materials: [Material; 2],
    pub projectile_mesh: MeshHandle,
    pub projectile_material: Material,
}

/// Arena scene plus the handles needed to keep it in step with a simulation.
#[derive(Debug, Clone)]
pub struct ArenaScene {
    scene: Scene,
    vehicles: [ObjectId; 2],
    rig: ChaseRig,
}

impl ArenaScene {
    /// Ground sized to the arena, then the vehicles, then projectiles.
    pub fn build(assets: &ArenaAssets, sim: &Simulation) -> Self {
        let bound = sim.config().arena_bound;
        let mut scene = Scene::new();
        scene.push_static(
            SceneObject::new(assets.ground_mesh, assets.ground_material)
                .with_model(
                    Mat4::from_translation(Vec3::Y * GROUND_LEVEL)
                        * Mat4::from_scale(Vec3::new(bound * 2.0, 1.0, bound * 2.0)),
                )
                .with_tiling(GROUND_TILING),
        );
        let vehicles = Side::BOTH.map(|side| {
            scene.push_static(
                SceneObject::new(assets.vehicle_mesh, assets.vehicle_materials[side.index()])
                    .with_model(sim.vehicle(side).model_matrix()),
            )
        });
        scene.push_projectiles(
            ProjectileArchetype::new(assets.projectile_mesh, assets.projectile_material)
                .with_tint(Vec4::new(1.0, 0.85, 0.4, 1.0)),
        );
        Self {
            scene,
            vehicles,
            rig: ChaseRig::default(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn vehicle_object(&self, side: Side) -> ObjectId {
        self.vehicles[side.index()]
    }

    /// Copy vehicle transforms out of the simulation.
    pub fn sync(&mut self, sim: &Simulation) {
        for side in Side::BOTH {
            self.scene
                .set_model(self.vehicles[side.index()], sim.vehicle(side).model_matrix());
        }
    }

    /// Chase views for a target of the given size: left player on the left
    /// half, right player on the right half.
    pub fn views(&self, sim: &Simulation, width: u32, height: u32) -> [SplitView; 2] {
        let viewports = split_horizontal(width, height);
        Side::BOTH.map(|side| {
            let viewport = viewports[side.index()];
            SplitView {
                camera: self.rig.camera(sim.vehicle(side), viewport.aspect()),
                viewport,
            }
        })
    }
}

/// One light of each kind: hemisphere ambient, a low sun, a warm lamp at the
/// arena center and a spot looking down onto it.
pub fn default_lights(arena_bound: f32) -> Vec<Light> {
    vec![
        Light::ambient(
            Vec3::new(0.25, 0.28, 0.35),
            Vec3::new(0.08, 0.07, 0.06),
            Vec3::Y,
        ),
        Light::directional(Vec3::new(0.8, 0.75, 0.65), Vec3::new(-0.4, -1.0, -0.3)),
        Light::point(
            Vec3::new(1.0, 0.6, 0.3),
            Vec3::new(0.0, 3.0, 0.0),
            Attenuation::new(0.02, 0.05, 1.0),
        ),
        Light::spot(
            Vec3::new(0.6, 0.8, 1.0),
            Vec3::new(0.0, arena_bound * 0.5, 0.0),
            Attenuation::new(0.0, 0.02, 1.0),
            Vec3::NEG_Y,
            15.0_f32.to_radians(),
            30.0_f32.to_radians(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::TextureHandle;
    use crate::light::LightKind;
    use crate::material::MaterialTextures;
    use crate::scene::SceneEntry;
    use arena_common::{FrameInput, Intent};
    use arena_sim::FIXED_DT;

    fn assets() -> ArenaAssets {
        let material = Material::new(MaterialTextures::uniform(TextureHandle(0)));
        ArenaAssets {
            ground_mesh: MeshHandle(0),
            ground_material: material,
            vehicle_mesh: MeshHandle(1),
            vehicle_materials: [material, material.with_albedo_tint(Vec3::X)],
            projectile_mesh: MeshHandle(2),
            projectile_material: material,
        }
    }

    #[test]
    fn scene_order_is_ground_vehicles_projectiles() {
        let sim = Simulation::default();
        let arena = ArenaScene::build(&assets(), &sim);
        let entries = arena.scene().entries();
        assert_eq!(entries.len(), 4);
        assert!(matches!(entries[0], SceneEntry::Static(o) if o.mesh == MeshHandle(0)));
        assert!(matches!(entries[3], SceneEntry::Projectiles(_)));
        let left = arena.scene().object(arena.vehicle_object(Side::Left));
        assert_eq!(
            left.map(|o| o.model),
            Some(sim.vehicle(Side::Left).model_matrix())
        );
    }

    #[test]
    fn sync_follows_vehicle_motion() {
        let mut sim = Simulation::default();
        let mut arena = ArenaScene::build(&assets(), &sim);
        let forward = Intent {
            forward: true,
            ..Intent::idle()
        };
        for _ in 0..10 {
            sim.step(&FrameInput::new(forward, Intent::idle()), FIXED_DT);
        }
        arena.sync(&sim);
        let model = arena
            .scene()
            .object(arena.vehicle_object(Side::Left))
            .map(|o| o.model);
        assert_eq!(model, Some(sim.vehicle(Side::Left).model_matrix()));
    }

    #[test]
    fn views_split_target_and_trail_each_vehicle() {
        let sim = Simulation::default();
        let arena = ArenaScene::build(&assets(), &sim);
        let [left, right] = arena.views(&sim, 1280, 720);
        assert_eq!(left.viewport.x, 0);
        assert_eq!(right.viewport.x, 640);
        assert!(left.camera.position.z < sim.vehicle(Side::Left).position.z);
        assert!(right.camera.position.z > sim.vehicle(Side::Right).position.z);
    }

    #[test]
    fn default_rig_has_one_light_per_kind_and_no_issues() {
        let lights = default_lights(20.0);
        let kinds: Vec<LightKind> = lights.iter().map(Light::kind).collect();
        assert_eq!(kinds, LightKind::ALL.to_vec());
        assert!(lights.iter().all(|l| l.diagnostics().is_empty()));
    }
}
