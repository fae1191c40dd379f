use std::fmt;

use glam::Vec4;

use crate::device::{
    BlendMode, MeshHandle, ProgramId, RenderDevice, TextureHandle, TextureUnit, Uniform,
};
use crate::viewport::Viewport;

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceCommand {
    Scissor(bool),
    Viewport(Viewport),
    Clear { color: Vec4, depth: f32 },
    Blend(BlendMode),
    UseProgram(ProgramId),
    Uniform(String, Uniform),
    BindTexture(TextureUnit, TextureHandle),
    Draw(MeshHandle),
}

impl fmt::Display for TraceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scissor(on) => write!(f, "scissor {}", if *on { "on" } else { "off" }),
            Self::Viewport(v) => write!(f, "viewport {} {} {}x{}", v.x, v.y, v.width, v.height),
            Self::Clear { color, depth } => write!(
                f,
                "clear color=({:.2}, {:.2}, {:.2}, {:.2}) depth={depth:.1}",
                color.x, color.y, color.z, color.w
            ),
            Self::Blend(mode) => write!(f, "blend {mode:?}"),
            Self::UseProgram(id) => write!(f, "program {}", id.0),
            Self::Uniform(name, value) => match value {
                Uniform::I1(v) => write!(f, "  uniform {name} = {v}"),
                Uniform::F1(v) => write!(f, "  uniform {name} = {v:.3}"),
                Uniform::F2(v) => write!(f, "  uniform {name} = ({:.3}, {:.3})", v.x, v.y),
                Uniform::F3(v) => {
                    write!(f, "  uniform {name} = ({:.3}, {:.3}, {:.3})", v.x, v.y, v.z)
                }
                Uniform::F4(v) => write!(
                    f,
                    "  uniform {name} = ({:.3}, {:.3}, {:.3}, {:.3})",
                    v.x, v.y, v.z, v.w
                ),
                Uniform::Mat4(m) => {
                    let t = m.w_axis;
                    write!(f, "  uniform {name} = mat4 t=({:.2}, {:.2}, {:.2})", t.x, t.y, t.z)
                }
            },
            Self::BindTexture(unit, tex) => write!(f, "  texture unit {} <- #{}", unit.index(), tex.0),
            Self::Draw(mesh) => write!(f, "  draw mesh #{}", mesh.0),
        }
    }
}

/// Debug text backend: records every call instead of drawing.
///
/// Used by the CLI to inspect a frame and by tests to check call order.
#[derive(Debug, Default, Clone)]
pub struct TraceDevice {
    commands: Vec<TraceCommand>,
}

impl TraceDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[TraceCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of recorded draw calls.
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, TraceCommand::Draw(_)))
            .count()
    }

    /// The trace as text, one call per line.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for command in &self.commands {
            out.push_str(&command.to_string());
            out.push('\n');
        }
        out
    }
}

impl RenderDevice for TraceDevice {
    fn enable_scissor(&mut self, enabled: bool) {
        self.commands.push(TraceCommand::Scissor(enabled));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(TraceCommand::Viewport(viewport));
    }

    fn clear(&mut self, color: Vec4, depth: f32) {
        self.commands.push(TraceCommand::Clear { color, depth });
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.commands.push(TraceCommand::Blend(mode));
    }

    fn use_program(&mut self, program: ProgramId) {
        self.commands.push(TraceCommand::UseProgram(program));
    }

    fn set_uniform(&mut self, name: &str, value: Uniform) {
        self.commands.push(TraceCommand::Uniform(name.to_string(), value));
    }

    fn bind_texture(&mut self, unit: TextureUnit, texture: TextureHandle) {
        self.commands.push(TraceCommand::BindTexture(unit, texture));
    }

    fn draw(&mut self, mesh: MeshHandle) {
        self.commands.push(TraceCommand::Draw(mesh));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn text_output_lists_calls_in_order() {
        let mut device = TraceDevice::new();
        device.enable_scissor(true);
        device.set_viewport(Viewport::new(0, 0, 640, 720));
        device.use_program(ProgramId(2));
        device.set_uniform("light.color", Uniform::F3(Vec3::new(1.0, 0.5, 0.25)));
        device.draw(MeshHandle(4));

        let text = device.render_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "scissor on");
        assert_eq!(lines[1], "viewport 0 0 640x720");
        assert_eq!(lines[2], "program 2");
        assert_eq!(lines[3], "  uniform light.color = (1.000, 0.500, 0.250)");
        assert_eq!(lines[4], "  draw mesh #4");
        assert_eq!(device.draw_count(), 1);
    }
}
