use std::ops::AddAssign;

use arena_sim::Projectile;
use glam::Vec4;

use crate::camera::Camera;
use crate::device::{BlendMode, ProgramTable, RenderDevice, Uniform};
use crate::light::{Light, LightKind};
use crate::scene::Scene;
use crate::viewport::Viewport;

/// Errors raised while setting up the renderer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no shader program linked for {0:?} lights")]
    MissingProgram(LightKind),
}

/// One half of the split screen: what to look through and where to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitView {
    pub camera: Camera,
    pub viewport: Viewport,
}

/// Work done by one render call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Enabled lights drawn, summed over views.
    pub light_passes: u32,
    pub draws: u32,
}

impl AddAssign for PassStats {
    fn add_assign(&mut self, rhs: Self) {
        self.light_passes += rhs.light_passes;
        self.draws += rhs.draws;
    }
}

/// Multi-pass forward renderer: every enabled light redraws the whole scene
/// with its own program, and the passes are summed by additive blending.
///
/// Reads the scene, lights and projectiles; mutates nothing but the device.
#[derive(Debug, Clone)]
pub struct Renderer {
    programs: ProgramTable,
    clear_color: Vec4,
}

impl Renderer {
    /// Fails if any light kind lacks a program.
    pub fn new(programs: ProgramTable) -> Result<Self, RenderError> {
        if let Some(kind) = programs.missing() {
            return Err(RenderError::MissingProgram(kind));
        }
        Ok(Self {
            programs,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
        })
    }

    pub fn with_clear_color(mut self, color: Vec4) -> Self {
        self.clear_color = color;
        self
    }

    pub fn programs(&self) -> &ProgramTable {
        &self.programs
    }

    /// Draw both halves of the split screen.
    ///
    /// The scissor test stays on for the whole frame, so each half's clear
    /// and draws stay inside its own rectangle.
    pub fn render_split(
        &self,
        device: &mut dyn RenderDevice,
        views: &[SplitView; 2],
        scene: &Scene,
        projectiles: &[Projectile],
        lights: &[Light],
    ) -> PassStats {
        let mut stats = PassStats::default();
        device.enable_scissor(true);
        for view in views {
            if view.viewport.is_empty() {
                continue;
            }
            device.set_viewport(view.viewport);
            device.clear(self.clear_color, 1.0);
            stats += self.draw_scene(device, &view.camera, scene, projectiles, lights);
        }
        device.enable_scissor(false);
        tracing::debug!(
            light_passes = stats.light_passes,
            draws = stats.draws,
            projectiles = projectiles.len(),
            "split frame rendered"
        );
        stats
    }

    /// Draw the scene once per enabled light, in list order.
    pub fn draw_scene(
        &self,
        device: &mut dyn RenderDevice,
        camera: &Camera,
        scene: &Scene,
        projectiles: &[Projectile],
        lights: &[Light],
    ) -> PassStats {
        let view_projection = camera.view_projection();
        let mut stats = PassStats::default();

        for light in lights.iter().filter(|light| light.is_enabled()) {
            let Some(program) = self.programs.get(light.kind()) else {
                continue;
            };
            let blend = if stats.light_passes == 0 {
                BlendMode::Opaque
            } else {
                BlendMode::Additive
            };
            device.set_blend(blend);
            device.use_program(program);
            device.set_uniform("VP", Uniform::Mat4(view_projection));
            device.set_uniform("cam_position", Uniform::F3(camera.position));
            light.upload(device);

            for entry in scene.entries() {
                stats.draws += entry.draw(device, projectiles);
            }
            stats.light_passes += 1;
        }
        stats
    }
}

/// Log setup problems of a light list. Returns how many were found.
pub fn report_light_issues(lights: &[Light]) -> usize {
    let mut count = 0;
    for (index, light) in lights.iter().enumerate() {
        for issue in light.diagnostics() {
            tracing::warn!(index, kind = light.kind().label(), "{issue}");
            count += 1;
        }
    }
    count
}
