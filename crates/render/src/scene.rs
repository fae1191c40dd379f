use arena_sim::Projectile;
use glam::{Mat4, Vec4};

use crate::device::{MeshHandle, RenderDevice, Uniform};
use crate::material::Material;

/// A drawable with its own transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    pub mesh: MeshHandle,
    pub material: Material,
    pub model: Mat4,
    /// UV repeat count.
    pub tiling_factor: f32,
    pub tint: Vec4,
}

impl SceneObject {
    pub fn new(mesh: MeshHandle, material: Material) -> Self {
        Self {
            mesh,
            material,
            model: Mat4::IDENTITY,
            tiling_factor: 1.0,
            tint: Vec4::ONE,
        }
    }

    pub fn with_model(mut self, model: Mat4) -> Self {
        self.model = model;
        self
    }

    pub fn with_tiling(mut self, tiling_factor: f32) -> Self {
        self.tiling_factor = tiling_factor;
        self
    }

    pub fn with_tint(mut self, tint: Vec4) -> Self {
        self.tint = tint;
        self
    }
}

/// Mesh and material shared by every live projectile.
///
/// `local` is applied under each projectile's own transform (mesh scale,
/// offset above the ground).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileArchetype {
    pub mesh: MeshHandle,
    pub material: Material,
    pub local: Mat4,
    pub tiling_factor: f32,
    pub tint: Vec4,
}

impl ProjectileArchetype {
    pub fn new(mesh: MeshHandle, material: Material) -> Self {
        Self {
            mesh,
            material,
            local: Mat4::IDENTITY,
            tiling_factor: 1.0,
            tint: Vec4::ONE,
        }
    }

    pub fn with_local(mut self, local: Mat4) -> Self {
        self.local = local;
        self
    }

    pub fn with_tint(mut self, tint: Vec4) -> Self {
        self.tint = tint;
        self
    }
}

/// One entry of the draw list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneEntry {
    Static(SceneObject),
    /// Expands to one draw per live projectile.
    Projectiles(ProjectileArchetype),
}

impl SceneEntry {
    /// Upload per-object state and issue this entry's draws. Returns the
    /// number of draw calls.
    pub fn draw(&self, device: &mut dyn RenderDevice, projectiles: &[Projectile]) -> u32 {
        match self {
            Self::Static(object) => {
                upload_model(device, object.model);
                device.set_uniform("tiling_factor", Uniform::F1(object.tiling_factor));
                device.set_uniform("tint", Uniform::F4(object.tint));
                object.material.bind(device);
                device.draw(object.mesh);
                1
            }
            Self::Projectiles(archetype) => {
                if projectiles.is_empty() {
                    return 0;
                }
                device.set_uniform("tiling_factor", Uniform::F1(archetype.tiling_factor));
                device.set_uniform("tint", Uniform::F4(archetype.tint));
                archetype.material.bind(device);
                for projectile in projectiles {
                    upload_model(device, projectile.model * archetype.local);
                    device.draw(archetype.mesh);
                }
                projectiles.len() as u32
            }
        }
    }
}

/// Upload `M` and its inverse-transpose `M_it`.
fn upload_model(device: &mut dyn RenderDevice, model: Mat4) {
    device.set_uniform("M", Uniform::Mat4(model));
    device.set_uniform("M_it", Uniform::Mat4(normal_matrix(model)));
}

/// Inverse-transpose for transforming normals. A singular model (zero scale)
/// has no inverse; identity is used so no NaN reaches the shader.
pub fn normal_matrix(model: Mat4) -> Mat4 {
    if model.determinant().abs() <= f32::EPSILON {
        Mat4::IDENTITY
    } else {
        model.inverse().transpose()
    }
}

/// Index of a static entry, for updating its transform each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

/// Ordered draw list. Order is draw order within every light pass.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    entries: Vec<SceneEntry>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_static(&mut self, object: SceneObject) -> ObjectId {
        self.entries.push(SceneEntry::Static(object));
        ObjectId(self.entries.len() - 1)
    }

    pub fn push_projectiles(&mut self, archetype: ProjectileArchetype) {
        self.entries.push(SceneEntry::Projectiles(archetype));
    }

    /// Replace a static object's transform. Returns false for an id that does
    /// not name a static entry.
    pub fn set_model(&mut self, id: ObjectId, model: Mat4) -> bool {
        match self.entries.get_mut(id.0) {
            Some(SceneEntry::Static(object)) => {
                object.model = model;
                true
            }
            _ => false,
        }
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        match self.entries.get(id.0) {
            Some(SceneEntry::Static(object)) => Some(object),
            _ => None,
        }
    }

    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
