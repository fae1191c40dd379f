//! wgpu backend for the arena renderer.
//!
//! Implements `RenderDevice` by recording the immediate-mode calls of a
//! frame and replaying them in one render pass. Each light kind is one
//! fragment entry point compiled into an opaque and an additive pipeline.
//!
//! # Invariants
//! - Opaque pipelines write depth; additive pipelines test depth with
//!   `LessEqual` and never write it, so later passes land on the same
//!   surfaces as the first.
//! - A clear only touches the scissor rectangle current at record time.
//! - Program creation failures surface as `GpuError` at startup, never
//!   mid-frame.

mod assets;
mod frame;
mod gpu;
mod shaders;
mod uniforms;

pub use assets::{MeshData, TextureData, Vertex};
pub use frame::{FrameCommand, FrameRecorder, Rect};
pub use gpu::{GpuError, WgpuDevice};
pub use shaders::{CLEAR_SHADER, LIGHT_ENTRY_POINTS, LIGHTING_SHADER};
pub use uniforms::DrawUniforms;
