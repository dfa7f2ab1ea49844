//! Shared value types passed between the physics world and the scene graph.

mod types;

pub use types::{Pose, Transform};
