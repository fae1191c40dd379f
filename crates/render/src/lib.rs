//! Backend-agnostic multi-pass lighting renderer.
//!
//! Every enabled light redraws the whole scene with the program for its kind;
//! the first pass writes, later passes add. Two chase cameras share one
//! target through scissored viewports.
//!
//! # Invariants
//! - The renderer never mutates scene objects, materials, lights or
//!   projectiles. Projectiles are moved by the simulation only.
//! - Disabled lights issue no device calls at all.
//! - The first enabled light of a pass is drawn `Opaque`, every later one
//!   `Additive`, so the result does not depend on light order.
//! - The scissor test is on for the whole split frame; each half's clear and
//!   draws stay inside its rectangle.
//! - Textures bind to fixed units: albedo 0, specular 1, roughness 2,
//!   emissive 3, ambient occlusion 4.

pub mod arena;
pub mod camera;
pub mod device;
pub mod light;
pub mod material;
pub mod renderer;
pub mod scene;
pub mod trace;
pub mod viewport;

pub use arena::{ArenaAssets, ArenaScene, default_lights};
pub use camera::{Camera, ChaseRig, Projection};
pub use device::{
    BlendMode, MeshHandle, ProgramId, ProgramTable, RenderDevice, TextureHandle, TextureUnit,
    Uniform,
};
pub use light::{Attenuation, FALLBACK_DIRECTION, Light, LightIssue, LightKind, LightSource};
pub use material::{Material, MaterialTextures};
pub use renderer::{PassStats, RenderError, Renderer, SplitView, report_light_issues};
pub use scene::{ObjectId, ProjectileArchetype, Scene, SceneEntry, SceneObject, normal_matrix};
pub use trace::{TraceCommand, TraceDevice};
pub use viewport::{Viewport, split_horizontal};

pub fn crate_info() -> &'static str {
    "arena-render v0.1.0"
}
