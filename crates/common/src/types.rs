use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Rigid pose: position and orientation, no scale.
///
/// This is what the physics world reports for a body every step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// True when every component is finite and the rotation can be normalized.
    pub fn is_valid(&self) -> bool {
        self.position.is_finite()
            && self.rotation.is_finite()
            && self.rotation.length_squared() > f32::EPSILON
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Spatial transform of a scene node: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    /// The rigid part of this transform.
    pub fn pose(&self) -> Pose {
        Pose {
            position: self.position,
            rotation: self.rotation,
        }
    }

    /// Overwrite position and rotation with `pose`. Scale is left alone.
    pub fn set_pose(&mut self, pose: Pose) {
        self.position = pose.position;
        self.rotation = pose.rotation;
    }

    /// Compose `self` (parent) with `child`, giving the child's transform in
    /// the parent's space.
    pub fn mul_transform(&self, child: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * (self.scale * child.position),
            rotation: self.rotation * child.rotation,
            scale: self.scale * child.scale,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl From<Pose> for Transform {
    fn from(pose: Pose) -> Self {
        Self {
            position: pose.position,
            rotation: pose.rotation,
            scale: Vec3::ONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn set_pose_overwrites_position_and_rotation_only() {
        let mut t = Transform {
            position: Vec3::new(1.0, 1.0, 1.0),
            rotation: Quat::from_rotation_x(0.3),
            scale: Vec3::splat(6.0),
        };
        let pose = Pose::new(Vec3::new(0.0, 40.0, 0.0), Quat::from_rotation_y(1.0));
        t.set_pose(pose);

        assert_eq!(t.position, pose.position);
        assert_eq!(t.rotation, pose.rotation);
        assert_eq!(t.scale, Vec3::splat(6.0));
        assert_eq!(t.pose(), pose);
    }

    #[test]
    fn mul_transform_applies_parent_rotation_and_scale() {
        let parent = Transform {
            position: Vec3::new(10.0, 0.0, 0.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };
        let child = Transform {
            position: Vec3::new(1.0, 0.0, 0.0),
            ..Transform::default()
        };
        let world = parent.mul_transform(&child);

        // +X rotated a quarter turn about Y lands on -Z, scaled by 2.
        assert!((world.position - Vec3::new(10.0, 0.0, -2.0)).length() < 1e-5);
        assert_eq!(world.scale, Vec3::splat(2.0));
    }

    #[test]
    fn pose_validity() {
        assert!(Pose::IDENTITY.is_valid());
        assert!(!Pose::from_position(Vec3::new(f32::NAN, 0.0, 0.0)).is_valid());
        assert!(!Pose::new(Vec3::ZERO, Quat::from_xyzw(0.0, 0.0, 0.0, 0.0)).is_valid());
    }
}
