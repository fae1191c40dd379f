use glam::Vec3;

use crate::device::{RenderDevice, TextureHandle, TextureUnit, Uniform};

/// The five texture slots of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialTextures {
    pub albedo: TextureHandle,
    pub specular: TextureHandle,
    pub roughness: TextureHandle,
    pub emissive: TextureHandle,
    pub ambient_occlusion: TextureHandle,
}

impl MaterialTextures {
    /// The same texture in every slot.
    pub fn uniform(texture: TextureHandle) -> Self {
        Self {
            albedo: texture,
            specular: texture,
            roughness: texture,
            emissive: texture,
            ambient_occlusion: texture,
        }
    }

    pub fn get(&self, unit: TextureUnit) -> TextureHandle {
        match unit {
            TextureUnit::Albedo => self.albedo,
            TextureUnit::Specular => self.specular,
            TextureUnit::Roughness => self.roughness,
            TextureUnit::Emissive => self.emissive,
            TextureUnit::AmbientOcclusion => self.ambient_occlusion,
        }
    }

    /// Handles in unit order.
    pub fn to_array(&self) -> [TextureHandle; 5] {
        TextureUnit::ALL.map(|unit| self.get(unit))
    }
}

/// Surface description of one scene object: shared textures plus tints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub textures: MaterialTextures,
    pub albedo_tint: Vec3,
    pub specular_tint: Vec3,
    pub emissive_tint: Vec3,
    pub roughness_scale: f32,
}

impl Material {
    /// Neutral tints: white albedo and specular, no emission, unscaled roughness.
    pub fn new(textures: MaterialTextures) -> Self {
        Self {
            textures,
            albedo_tint: Vec3::ONE,
            specular_tint: Vec3::ONE,
            emissive_tint: Vec3::ZERO,
            roughness_scale: 1.0,
        }
    }

    pub fn with_albedo_tint(mut self, tint: Vec3) -> Self {
        self.albedo_tint = tint;
        self
    }

    pub fn with_specular_tint(mut self, tint: Vec3) -> Self {
        self.specular_tint = tint;
        self
    }

    pub fn with_emissive_tint(mut self, tint: Vec3) -> Self {
        self.emissive_tint = tint;
        self
    }

    pub fn with_roughness_scale(mut self, scale: f32) -> Self {
        self.roughness_scale = scale;
        self
    }

    /// Upload tints and bind all five textures, albedo first.
    pub fn bind(&self, device: &mut dyn RenderDevice) {
        device.set_uniform("material.albedo_tint", Uniform::F3(self.albedo_tint));
        device.set_uniform("material.specular_tint", Uniform::F3(self.specular_tint));
        device.set_uniform("material.emissive_tint", Uniform::F3(self.emissive_tint));
        device.set_uniform("material.roughness_scale", Uniform::F1(self.roughness_scale));
        for unit in TextureUnit::ALL {
            device.set_uniform(unit.sampler_name(), Uniform::I1(unit.index() as i32));
            device.bind_texture(unit, self.textures.get(unit));
        }
    }
}
