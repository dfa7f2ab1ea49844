//! Synchronization: the per-frame bridge between the physics world and the scene graph.
//!
//! # Invariants
//! - Every pairing is synced exactly once per simulation step, in pairing order.
//! - No mesh is synced unless `step_simulation` ran in the same frame.
//! - The frame loop stops only through its `StopToken` or an exhausted frame source.
//! - All world and scene mutation happens on the frame loop's thread.

mod clock;
mod config;
mod context;
mod error;
mod frame_loop;
mod pairing;
mod rng;
mod spawner;
mod timer;

pub use clock::{FrameClock, LoopState};
pub use config::{BodyTemplate, ConfigError, GroundConfig, LayoutConfig, SceneConfig, SpawnerConfig};
pub use context::{AppContext, FrameReport};
pub use error::SyncError;
pub use frame_loop::{
    FixedFrames, FrameLoop, FrameSource, LoopSummary, RealtimeFrames, ScriptedFrames, StopToken,
};
pub use pairing::{PhysicsObject, sync_transforms};
pub use rng::SplitMix64;
pub use spawner::{SpawnRequest, Spawner};
pub use timer::FrameTimer;

pub fn crate_info() -> &'static str {
    "tumble-sync v0.1.0"
}
