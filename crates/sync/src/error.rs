use tumble_physics::PhysicsError;
use tumble_scene::SceneError;

use crate::config::ConfigError;

/// Errors surfaced by the frame loop and the application context.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("physics error: {0}")]
    Physics(#[from] PhysicsError),
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
