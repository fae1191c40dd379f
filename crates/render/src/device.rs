use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::light::LightKind;
use crate::viewport::Viewport;

/// Backend handle of a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Backend handle of an uploaded texture. Shared by any number of materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Backend handle of an uploaded mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Framebuffer write mode for a light pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Replace color, write depth. Used by the first light of a pass.
    Opaque,
    /// `src + dst`, depth test only.
    Additive,
}

/// Fixed texture unit of each material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureUnit {
    Albedo = 0,
    Specular = 1,
    Roughness = 2,
    Emissive = 3,
    AmbientOcclusion = 4,
}

impl TextureUnit {
    /// All units in bind order.
    pub const ALL: [TextureUnit; 5] = [
        Self::Albedo,
        Self::Specular,
        Self::Roughness,
        Self::Emissive,
        Self::AmbientOcclusion,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Name of the sampler uniform that reads this unit.
    pub fn sampler_name(self) -> &'static str {
        match self {
            Self::Albedo => "material.albedo",
            Self::Specular => "material.specular",
            Self::Roughness => "material.roughness",
            Self::Emissive => "material.emissive",
            Self::AmbientOcclusion => "material.ambient_occlusion",
        }
    }
}

/// A uniform value, one variant per upload call of the program service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    I1(i32),
    F1(f32),
    F2(Vec2),
    F3(Vec3),
    F4(Vec4),
    Mat4(Mat4),
}

/// Draw-state and shader-program service the renderer drives.
///
/// The calls mirror a classic immediate-mode graphics API: state is set, then
/// `draw` consumes whatever is current. Uniform names follow a fixed contract
/// (`VP`, `cam_position`, `M`, `M_it`, `tiling_factor`, `tint`, `material.*`,
/// `light.*`); a backend ignores names its programs do not use.
pub trait RenderDevice {
    /// Toggle the scissor test. While enabled, clears and draws touch only
    /// the current viewport rectangle.
    fn enable_scissor(&mut self, enabled: bool);

    /// Set the viewport and the scissor rectangle.
    fn set_viewport(&mut self, viewport: Viewport);

    /// Clear color and depth inside the current rectangle.
    fn clear(&mut self, color: Vec4, depth: f32);

    fn set_blend(&mut self, mode: BlendMode);

    fn use_program(&mut self, program: ProgramId);

    /// Upload a uniform to the active program.
    fn set_uniform(&mut self, name: &str, value: Uniform);

    fn bind_texture(&mut self, unit: TextureUnit, texture: TextureHandle);

    /// Draw a mesh with the current state.
    fn draw(&mut self, mesh: MeshHandle);
}

/// Light kind to shader program lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramTable {
    programs: [Option<ProgramId>; 4],
}

impl ProgramTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with one program per kind, in `LightKind::ALL` order.
    pub fn from_programs(programs: [ProgramId; 4]) -> Self {
        Self {
            programs: programs.map(Some),
        }
    }

    pub fn insert(&mut self, kind: LightKind, program: ProgramId) -> Option<ProgramId> {
        self.programs[kind.index()].replace(program)
    }

    pub fn get(&self, kind: LightKind) -> Option<ProgramId> {
        self.programs[kind.index()]
    }

    /// First kind without a program, if any.
    pub fn missing(&self) -> Option<LightKind> {
        LightKind::ALL
            .into_iter()
            .find(|kind| self.programs[kind.index()].is_none())
    }
}
