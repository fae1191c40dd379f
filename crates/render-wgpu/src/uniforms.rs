use arena_render::{TextureUnit, Uniform};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

/// Per-draw uniform block, shared by every lighting program.
///
/// Layout matches `DrawUniforms` in the WGSL module: matrices first, then
/// 16-byte vectors. Scalars are packed into `params`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct DrawUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub model_it: [[f32; 4]; 4],
    pub cam_position: [f32; 4],
    pub tint: [f32; 4],
    pub albedo_tint: [f32; 4],
    pub specular_tint: [f32; 4],
    pub emissive_tint: [f32; 4],
    /// x: tiling factor, y: roughness scale, z: inner cone, w: outer cone.
    pub params: [f32; 4],
    /// Light color; the sky color for ambient lights.
    pub light_color: [f32; 4],
    pub light_ground: [f32; 4],
    /// Light direction; the sky direction for ambient lights.
    pub light_direction: [f32; 4],
    pub light_position: [f32; 4],
    /// (quadratic, linear, constant)
    pub light_attenuation: [f32; 4],
}

impl Default for DrawUniforms {
    fn default() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        Self {
            view_proj: identity,
            model: identity,
            model_it: identity,
            cam_position: [0.0, 0.0, 0.0, 1.0],
            tint: [1.0; 4],
            albedo_tint: [1.0; 4],
            specular_tint: [1.0; 4],
            emissive_tint: [0.0; 4],
            params: [1.0, 1.0, 0.0, 0.0],
            light_color: [0.0; 4],
            light_ground: [0.0; 4],
            light_direction: [0.0, -1.0, 0.0, 0.0],
            light_position: [0.0; 4],
            light_attenuation: [0.0, 0.0, 1.0, 0.0],
        }
    }
}

/// Outcome of applying a named uniform to the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Stored,
    /// Sampler uniform naming its fixed unit; bindings are static here.
    FixedSampler,
    UnknownName,
    WrongType,
}

impl DrawUniforms {
    /// Store a uniform by its contract name.
    pub fn apply(&mut self, name: &str, value: Uniform) -> Applied {
        let slot: &mut [f32; 4] = match name {
            "VP" | "M" | "M_it" => {
                let Uniform::Mat4(m) = value else {
                    return Applied::WrongType;
                };
                let target = match name {
                    "VP" => &mut self.view_proj,
                    "M" => &mut self.model,
                    _ => &mut self.model_it,
                };
                *target = m.to_cols_array_2d();
                return Applied::Stored;
            }
            "tiling_factor" => return store_scalar(&mut self.params[0], value),
            "material.roughness_scale" => return store_scalar(&mut self.params[1], value),
            "light.inner_cone" => return store_scalar(&mut self.params[2], value),
            "light.outer_cone" => return store_scalar(&mut self.params[3], value),
            "cam_position" => &mut self.cam_position,
            "tint" => &mut self.tint,
            "material.albedo_tint" => &mut self.albedo_tint,
            "material.specular_tint" => &mut self.specular_tint,
            "material.emissive_tint" => &mut self.emissive_tint,
            "light.color" | "light.sky_color" => &mut self.light_color,
            "light.ground_color" => &mut self.light_ground,
            "light.direction" | "light.sky_direction" => &mut self.light_direction,
            "light.position" => &mut self.light_position,
            "light.attenuation" => &mut self.light_attenuation,
            _ => {
                return match TextureUnit::ALL.iter().find(|u| u.sampler_name() == name) {
                    Some(unit) if value == Uniform::I1(unit.index() as i32) => {
                        Applied::FixedSampler
                    }
                    Some(_) => Applied::WrongType,
                    None => Applied::UnknownName,
                };
            }
        };
        let v = match value {
            Uniform::F3(v) => v.extend(0.0),
            Uniform::F4(v) => v,
            _ => return Applied::WrongType,
        };
        *slot = v.to_array();
        Applied::Stored
    }

    /// Block used by the clear pipeline: only `tint` is read.
    pub fn clear_color(color: Vec4) -> Self {
        Self {
            tint: color.to_array(),
            ..Self::default()
        }
    }
}

fn store_scalar(slot: &mut f32, value: Uniform) -> Applied {
    match value {
        Uniform::F1(v) => {
            *slot = v;
            Applied::Stored
        }
        _ => Applied::WrongType,
    }
}

/// Round `size` up to the dynamic offset alignment.
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn block_size_is_multiple_of_sixteen() {
        assert_eq!(std::mem::size_of::<DrawUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 3 * 64 + 11 * 16);
    }

    #[test]
    fn contract_names_land_in_their_slots() {
        let mut block = DrawUniforms::default();
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(block.apply("M", Uniform::Mat4(m)), Applied::Stored);
        assert_eq!(block.apply("tiling_factor", Uniform::F1(8.0)), Applied::Stored);
        assert_eq!(
            block.apply("light.sky_color", Uniform::F3(Vec3::new(0.1, 0.2, 0.3))),
            Applied::Stored
        );
        assert_eq!(block.apply("light.outer_cone", Uniform::F1(0.5)), Applied::Stored);
        assert_eq!(block.model, m.to_cols_array_2d());
        assert_eq!(block.params, [8.0, 1.0, 0.0, 0.5]);
        assert_eq!(block.light_color, [0.1, 0.2, 0.3, 0.0]);
    }

    #[test]
    fn samplers_must_match_fixed_units() {
        let mut block = DrawUniforms::default();
        assert_eq!(
            block.apply("material.specular", Uniform::I1(1)),
            Applied::FixedSampler
        );
        assert_eq!(
            block.apply("material.specular", Uniform::I1(3)),
            Applied::WrongType
        );
    }

    #[test]
    fn unknown_and_mistyped_uniforms_leave_block_untouched() {
        let mut block = DrawUniforms::default();
        let before = block;
        assert_eq!(block.apply("light.shadow_bias", Uniform::F1(1.0)), Applied::UnknownName);
        assert_eq!(block.apply("VP", Uniform::F1(1.0)), Applied::WrongType);
        assert_eq!(block.apply("tint", Uniform::F1(1.0)), Applied::WrongType);
        assert_eq!(block, before);
    }

    #[test]
    fn stride_rounds_to_alignment() {
        assert_eq!(aligned_stride(368, 256), 512);
        assert_eq!(aligned_stride(256, 256), 256);
        assert_eq!(aligned_stride(10, 0), 10);
    }
}
