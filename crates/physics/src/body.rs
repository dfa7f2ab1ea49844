use glam::{Quat, Vec3};
use rapier3d::prelude::{
    CoefficientCombineRule, Collider, ColliderBuilder, RigidBody as EngineBody, RigidBodyBuilder,
};
use serde::{Deserialize, Serialize};
use tumble_common::Pose;

use crate::convert::to_isometry;
use crate::error::{PhysicsError, check_coefficient};

/// Default coefficients match the engine-side defaults of a fresh body.
const DEFAULT_FRICTION: f32 = 0.5;
const DEFAULT_RESTITUTION: f32 = 0.0;
const DEFAULT_ROLLING_FRICTION: f32 = 0.0;

/// Collision shape of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Axis-aligned (in body space) box, stored as half extents.
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
}

impl Shape {
    /// Full edge lengths of the shape's bounding box.
    pub fn size(&self) -> Vec3 {
        match self {
            Shape::Box { half_extents } => *half_extents * 2.0,
            Shape::Sphere { radius } => Vec3::splat(radius * 2.0),
        }
    }

    fn collider_builder(&self) -> ColliderBuilder {
        match *self {
            Shape::Box { half_extents: h } => ColliderBuilder::cuboid(h.x, h.y, h.z),
            Shape::Sphere { radius } => ColliderBuilder::ball(radius),
        }
    }
}

/// A configured rigid body, ready to be added to a [`PhysicsWorld`].
///
/// Values are only obtainable from [`RigidBody::create_box`] or
/// [`RigidBody::create_sphere`], so every body is shaped exactly once.
/// [`PhysicsWorld::add_rigid_body`] consumes it.
///
/// [`PhysicsWorld`]: crate::PhysicsWorld
/// [`PhysicsWorld::add_rigid_body`]: crate::PhysicsWorld::add_rigid_body
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    shape: Shape,
    mass: f32,
    pose: Pose,
    restitution: f32,
    friction: f32,
    rolling_friction: f32,
}

impl RigidBody {
    /// Box body with full edge lengths `size`. `mass == 0.0` makes it fixed.
    pub fn create_box(
        mass: f32,
        position: Vec3,
        rotation: Quat,
        size: Vec3,
    ) -> Result<Self, PhysicsError> {
        if !size.is_finite() || size.min_element() <= 0.0 {
            return Err(PhysicsError::InvalidShape(format!(
                "box size {size} must be finite and positive on every axis"
            )));
        }
        Self::new(
            Shape::Box {
                half_extents: size * 0.5,
            },
            mass,
            Pose::new(position, rotation),
        )
    }

    /// Sphere body of the given radius with identity orientation.
    pub fn create_sphere(mass: f32, position: Vec3, radius: f32) -> Result<Self, PhysicsError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(PhysicsError::InvalidShape(format!(
                "sphere radius {radius} must be finite and positive"
            )));
        }
        Self::new(Shape::Sphere { radius }, mass, Pose::from_position(position))
    }

    fn new(shape: Shape, mass: f32, pose: Pose) -> Result<Self, PhysicsError> {
        if !mass.is_finite() || mass < 0.0 {
            return Err(PhysicsError::InvalidMass(mass));
        }
        if !pose.is_valid() {
            return Err(PhysicsError::InvalidPose);
        }
        Ok(Self {
            shape,
            mass,
            pose: Pose::new(pose.position, pose.rotation.normalize()),
            restitution: DEFAULT_RESTITUTION,
            friction: DEFAULT_FRICTION,
            rolling_friction: DEFAULT_ROLLING_FRICTION,
        })
    }

    pub fn set_restitution(&mut self, restitution: f32) -> Result<(), PhysicsError> {
        self.restitution = check_coefficient("restitution", restitution)?;
        Ok(())
    }

    pub fn set_friction(&mut self, friction: f32) -> Result<(), PhysicsError> {
        self.friction = check_coefficient("friction", friction)?;
        Ok(())
    }

    /// Resistance to rolling. Applied as angular damping on the engine body.
    pub fn set_rolling_friction(&mut self, rolling_friction: f32) -> Result<(), PhysicsError> {
        self.rolling_friction = check_coefficient("rolling friction", rolling_friction)?;
        Ok(())
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn rolling_friction(&self) -> f32 {
        self.rolling_friction
    }

    /// Zero mass: infinite effective mass, never moved by the solver.
    pub fn is_static(&self) -> bool {
        self.mass == 0.0
    }

    /// Build the engine-side body and its collider.
    pub(crate) fn build(&self) -> (EngineBody, Collider) {
        let builder = if self.is_static() {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
        };
        let body = builder
            .position(to_isometry(&self.pose))
            .angular_damping(self.rolling_friction)
            .build();

        // Coefficients multiply on contact.
        let mut collider = self
            .shape
            .collider_builder()
            .restitution(self.restitution)
            .restitution_combine_rule(CoefficientCombineRule::Multiply)
            .friction(self.friction)
            .friction_combine_rule(CoefficientCombineRule::Multiply);
        if !self.is_static() {
            // Inertia follows from the shape and this total mass.
            collider = collider.mass(self.mass);
        }
        (body, collider.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_box_stores_half_extents() {
        let rb = RigidBody::create_box(0.0, Vec3::ZERO, Quat::IDENTITY, Vec3::new(100.0, 1.0, 100.0))
            .unwrap();
        assert_eq!(
            rb.shape(),
            Shape::Box {
                half_extents: Vec3::new(50.0, 0.5, 50.0)
            }
        );
        assert_eq!(rb.shape().size(), Vec3::new(100.0, 1.0, 100.0));
        assert!(rb.is_static());
    }

    #[test]
    fn create_sphere_is_dynamic_with_positive_mass() {
        let rb = RigidBody::create_sphere(1.0, Vec3::new(0.0, 40.0, 0.0), 4.0).unwrap();
        assert!(!rb.is_static());
        assert_eq!(rb.shape(), Shape::Sphere { radius: 4.0 });
        assert_eq!(rb.pose().position, Vec3::new(0.0, 40.0, 0.0));
        assert_eq!(rb.pose().rotation, Quat::IDENTITY);
    }

    #[test]
    fn new_bodies_have_default_coefficients() {
        let rb = RigidBody::create_sphere(1.0, Vec3::ZERO, 1.0).unwrap();
        assert_eq!(rb.restitution(), 0.0);
        assert_eq!(rb.friction(), 0.5);
        assert_eq!(rb.rolling_friction(), 0.0);
    }

    #[test]
    fn setters_round_trip() {
        let mut rb = RigidBody::create_box(1.0, Vec3::ZERO, Quat::IDENTITY, Vec3::splat(6.0)).unwrap();
        rb.set_restitution(0.25).unwrap();
        rb.set_friction(100.0).unwrap();
        rb.set_rolling_friction(500.0).unwrap();
        assert_eq!(rb.restitution(), 0.25);
        assert_eq!(rb.friction(), 100.0);
        assert_eq!(rb.rolling_friction(), 500.0);
    }

    #[test]
    fn negative_mass_is_rejected() {
        let err = RigidBody::create_sphere(-1.0, Vec3::ZERO, 4.0).unwrap_err();
        assert_eq!(err, PhysicsError::InvalidMass(-1.0));
    }

    #[test]
    fn degenerate_dimensions_are_rejected() {
        assert!(matches!(
            RigidBody::create_box(1.0, Vec3::ZERO, Quat::IDENTITY, Vec3::new(1.0, 0.0, 1.0)),
            Err(PhysicsError::InvalidShape(_))
        ));
        assert!(matches!(
            RigidBody::create_sphere(1.0, Vec3::ZERO, f32::NAN),
            Err(PhysicsError::InvalidShape(_))
        ));
    }

    #[test]
    fn non_finite_position_is_rejected() {
        let err = RigidBody::create_sphere(1.0, Vec3::new(0.0, f32::INFINITY, 0.0), 1.0).unwrap_err();
        assert_eq!(err, PhysicsError::InvalidPose);
    }

    #[test]
    fn bad_coefficients_are_rejected_and_leave_value_alone() {
        let mut rb = RigidBody::create_sphere(1.0, Vec3::ZERO, 1.0).unwrap();
        rb.set_friction(2.0).unwrap();
        let err = rb.set_friction(-0.1).unwrap_err();
        assert!(matches!(
            err,
            PhysicsError::InvalidCoefficient {
                name: "friction",
                ..
            }
        ));
        assert_eq!(rb.friction(), 2.0);
    }

    #[test]
    fn rotation_is_normalized_on_construction() {
        let rb = RigidBody::create_box(
            1.0,
            Vec3::ZERO,
            Quat::from_xyzw(0.0, 0.0, 0.0, 3.0),
            Vec3::ONE,
        )
        .unwrap();
        assert!((rb.pose().rotation.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn build_maps_mass_and_damping() {
        let mut rb = RigidBody::create_sphere(2.0, Vec3::ZERO, 1.0).unwrap();
        rb.set_rolling_friction(5.0).unwrap();
        let (body, collider) = rb.build();
        assert!(body.is_dynamic());
        assert_eq!(body.angular_damping(), 5.0);
        assert!((collider.mass() - 2.0).abs() < 1e-4);

        let ground =
            RigidBody::create_box(0.0, Vec3::ZERO, Quat::IDENTITY, Vec3::splat(1.0)).unwrap();
        let (body, _) = ground.build();
        assert!(body.is_fixed());
    }
}
