//! Physics: rigid-body adapter, fixed-step world stepping, motion states.
//!
//! # Invariants
//! - A `RigidBody` is shaped exactly once; adding it to the world consumes it.
//! - Mass 0 means a fixed body. Fixed bodies never move.
//! - `step_simulation` never runs more than `max_sub_steps` engine steps.
//! - Motion states are refreshed after every `step_simulation` call and only then.

mod body;
mod convert;
mod error;
mod world;

pub use body::{RigidBody, Shape};
pub use error::PhysicsError;
pub use world::{BodyHandle, PhysicsWorld, StepReport, WorldConfig};

pub fn crate_info() -> &'static str {
    "tumble-physics v0.1.0"
}
