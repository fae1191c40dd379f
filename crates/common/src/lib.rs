//! Shared vocabulary between input, simulation and rendering.
//!
//! # Invariants
//! - The simulation consumes `FrameInput`, never raw key state.
//! - Headings are yaw-only, in radians, measured from +Z towards +X.

mod types;

pub use types::{FrameInput, Intent, Side, heading_forward};

pub fn crate_info() -> &'static str {
    "arena-common v0.1.0"
}
