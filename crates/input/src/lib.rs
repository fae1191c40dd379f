//! Input: two players on one keyboard, mapped to per-side intents.
//!
//! # Invariants
//! - Each logical key is polled once per frame per side.
//! - The simulation consumes `FrameInput`, never raw key state.
//! - In `FireMode::Edge` a held fire key yields exactly one `fire` frame.

pub mod keys;
pub mod mapper;

pub use keys::{Key, KeySource, KeyboardState};
pub use mapper::{Bindings, FireMode, InputConfig, InputMapper, SideBindings};

pub fn crate_info() -> &'static str {
    "arena-input v0.1.0"
}
