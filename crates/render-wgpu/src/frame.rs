use arena_render::{
    BlendMode, MeshHandle, ProgramId, RenderDevice, TextureHandle, TextureUnit, Uniform, Viewport,
};
use glam::Vec4;

use crate::uniforms::{Applied, DrawUniforms};

/// Pixel rectangle clipped to the render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    fn clip(viewport: Viewport, width: u32, height: u32) -> Self {
        let x = viewport.x.min(width);
        let y = viewport.y.min(height);
        Self {
            x,
            y,
            width: viewport.width.min(width - x),
            height: viewport.height.min(height - y),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// One recorded pass operation. `block` indexes the frame's uniform blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameCommand {
    Clear {
        rect: Rect,
        block: usize,
    },
    Draw {
        program: ProgramId,
        blend: BlendMode,
        viewport: Rect,
        scissor: Rect,
        block: usize,
        textures: [TextureHandle; 5],
        mesh: MeshHandle,
    },
}

/// Records device state changes into a replayable command list.
///
/// wgpu encodes a frame in one render pass, so immediate-mode calls are
/// captured with a snapshot of the uniform block at every draw and replayed
/// on submit.
#[derive(Debug, Clone)]
pub struct FrameRecorder {
    target: (u32, u32),
    scissor: bool,
    viewport: Option<Viewport>,
    blend: BlendMode,
    program: Option<ProgramId>,
    current: DrawUniforms,
    textures: [Option<TextureHandle>; 5],
    blocks: Vec<DrawUniforms>,
    commands: Vec<FrameCommand>,
}

impl FrameRecorder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            target: (width, height),
            scissor: false,
            viewport: None,
            blend: BlendMode::Opaque,
            program: None,
            current: DrawUniforms::default(),
            textures: [None; 5],
            blocks: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn set_target(&mut self, width: u32, height: u32) {
        self.target = (width, height);
    }

    pub fn commands(&self) -> &[FrameCommand] {
        &self.commands
    }

    pub fn blocks(&self) -> &[DrawUniforms] {
        &self.blocks
    }

    /// Drop the recorded frame, keeping bound state.
    pub fn reset(&mut self) {
        self.commands.clear();
        self.blocks.clear();
    }

    fn viewport_rect(&self) -> Rect {
        let (w, h) = self.target;
        match self.viewport {
            Some(viewport) => Rect::clip(viewport, w, h),
            None => Rect::full(w, h),
        }
    }

    fn scissor_rect(&self) -> Rect {
        if self.scissor {
            self.viewport_rect()
        } else {
            Rect::full(self.target.0, self.target.1)
        }
    }

    fn push_block(&mut self, block: DrawUniforms) -> usize {
        self.blocks.push(block);
        self.blocks.len() - 1
    }
}

impl RenderDevice for FrameRecorder {
    fn enable_scissor(&mut self, enabled: bool) {
        self.scissor = enabled;
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    fn clear(&mut self, color: Vec4, _depth: f32) {
        // The clear pipeline always writes the far plane.
        let rect = self.scissor_rect();
        if rect.is_empty() {
            return;
        }
        let block = self.push_block(DrawUniforms::clear_color(color));
        self.commands.push(FrameCommand::Clear { rect, block });
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    fn use_program(&mut self, program: ProgramId) {
        self.program = Some(program);
    }

    fn set_uniform(&mut self, name: &str, value: Uniform) {
        match self.current.apply(name, value) {
            Applied::Stored | Applied::FixedSampler => {}
            Applied::UnknownName => tracing::debug!(uniform = name, "uniform not used by lighting programs"),
            Applied::WrongType => tracing::debug!(uniform = name, ?value, "uniform type mismatch, ignored"),
        }
    }

    fn bind_texture(&mut self, unit: TextureUnit, texture: TextureHandle) {
        self.textures[unit.index()] = Some(texture);
    }

    fn draw(&mut self, mesh: MeshHandle) {
        let Some(program) = self.program else {
            tracing::warn!(mesh = mesh.0, "draw without a program, skipped");
            return;
        };
        let [Some(a), Some(b), Some(c), Some(d), Some(e)] = self.textures else {
            tracing::warn!(mesh = mesh.0, "draw with unbound material textures, skipped");
            return;
        };
        let viewport = self.viewport_rect();
        let scissor = self.scissor_rect();
        if viewport.is_empty() || scissor.is_empty() {
            return;
        }
        let block = self.push_block(self.current);
        self.commands.push(FrameCommand::Draw {
            program,
            blend: self.blend,
            viewport,
            scissor,
            block,
            textures: [a, b, c, d, e],
            mesh,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    fn bind_all(recorder: &mut FrameRecorder) {
        for unit in TextureUnit::ALL {
            recorder.bind_texture(unit, TextureHandle(unit.index() as u32 + 10));
        }
    }

    #[test]
    fn clear_covers_viewport_only_under_scissor() {
        let mut recorder = FrameRecorder::new(1280, 720);
        recorder.set_viewport(Viewport::new(640, 0, 640, 720));
        recorder.clear(Vec4::ZERO, 1.0);
        recorder.enable_scissor(true);
        recorder.clear(Vec4::ONE, 1.0);

        let rects: Vec<Rect> = recorder
            .commands()
            .iter()
            .map(|c| match c {
                FrameCommand::Clear { rect, .. } => *rect,
                FrameCommand::Draw { .. } => panic!("unexpected draw"),
            })
            .collect();
        assert_eq!(rects[0], Rect::full(1280, 720));
        assert_eq!(
            rects[1],
            Rect {
                x: 640,
                y: 0,
                width: 640,
                height: 720
            }
        );
        assert_eq!(recorder.blocks()[1].tint, [1.0; 4]);
    }

    #[test]
    fn draw_snapshots_uniforms_and_state() {
        let mut recorder = FrameRecorder::new(800, 600);
        recorder.enable_scissor(true);
        recorder.set_viewport(Viewport::new(0, 0, 400, 600));
        recorder.set_blend(BlendMode::Additive);
        recorder.use_program(ProgramId(2));
        bind_all(&mut recorder);

        let first = Mat4::from_translation(glam::Vec3::X);
        recorder.set_uniform("M", Uniform::Mat4(first));
        recorder.draw(MeshHandle(5));
        recorder.set_uniform("M", Uniform::Mat4(Mat4::IDENTITY));
        recorder.draw(MeshHandle(5));

        assert_eq!(recorder.commands().len(), 2);
        let FrameCommand::Draw {
            program,
            blend,
            scissor,
            block,
            textures,
            ..
        } = recorder.commands()[0]
        else {
            panic!("expected draw");
        };
        assert_eq!(program, ProgramId(2));
        assert_eq!(blend, BlendMode::Additive);
        assert_eq!(scissor.width, 400);
        assert_eq!(textures[0], TextureHandle(10));
        assert_eq!(recorder.blocks()[block].model, first.to_cols_array_2d());
        assert_eq!(recorder.blocks()[1].model, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn incomplete_state_skips_draw() {
        let mut recorder = FrameRecorder::new(800, 600);
        recorder.draw(MeshHandle(0));
        recorder.use_program(ProgramId(0));
        recorder.draw(MeshHandle(0));
        assert!(recorder.commands().is_empty());
        bind_all(&mut recorder);
        recorder.draw(MeshHandle(0));
        assert_eq!(recorder.commands().len(), 1);
    }

    #[test]
    fn viewport_is_clipped_to_target() {
        let mut recorder = FrameRecorder::new(100, 100);
        recorder.enable_scissor(true);
        recorder.set_viewport(Viewport::new(60, 0, 80, 100));
        recorder.clear(Vec4::ZERO, 1.0);
        recorder.set_viewport(Viewport::new(200, 0, 50, 100));
        recorder.clear(Vec4::ZERO, 1.0);
        assert_eq!(recorder.commands().len(), 1);
        assert!(matches!(
            recorder.commands()[0],
            FrameCommand::Clear { rect: Rect { x: 60, width: 40, .. }, .. }
        ));
    }

    #[test]
    fn reset_drops_frame_but_keeps_bindings() {
        let mut recorder = FrameRecorder::new(10, 10);
        recorder.use_program(ProgramId(1));
        bind_all(&mut recorder);
        recorder.draw(MeshHandle(1));
        recorder.reset();
        assert!(recorder.commands().is_empty());
        assert!(recorder.blocks().is_empty());
        recorder.draw(MeshHandle(1));
        assert_eq!(recorder.commands().len(), 1);
    }
}
