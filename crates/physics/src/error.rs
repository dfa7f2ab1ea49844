use glam::Vec3;

use crate::world::BodyHandle;

/// Errors from body construction and world stepping.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    #[error("invalid mass {0}: must be finite and >= 0")]
    InvalidMass(f32),
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    #[error("invalid pose: position must be finite and rotation non-zero")]
    InvalidPose,
    #[error("invalid {name} coefficient {value}: must be finite and >= 0")]
    InvalidCoefficient { name: &'static str, value: f32 },
    #[error("invalid time step {0}: must be finite and >= 0")]
    InvalidTimeStep(f32),
    #[error("invalid fixed time step {0}: must be finite and > 0")]
    InvalidFixedTimeStep(f32),
    #[error("invalid gravity {0}: must be finite")]
    InvalidGravity(Vec3),
    #[error("unknown body {0}")]
    UnknownBody(BodyHandle),
}

/// Coefficients shared by the adapter and the world setters.
pub(crate) fn check_coefficient(name: &'static str, value: f32) -> Result<f32, PhysicsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(PhysicsError::InvalidCoefficient { name, value })
    }
}
