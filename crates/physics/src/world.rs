use glam::{Quat, Vec3};
use rapier3d::na::Vector3;
use rapier3d::prelude::{
    CCDSolver, ColliderHandle, ColliderSet, DefaultBroadPhase, ImpulseJointSet,
    IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline,
    RigidBodyHandle, RigidBodySet,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tumble_common::Pose;

use crate::body::RigidBody;
use crate::convert::{from_isometry, from_vector, to_vector};
use crate::error::{PhysicsError, check_coefficient};

/// World-level simulation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Gravity acceleration in world units per second squared.
    pub gravity: Vec3,
    /// Length of one engine sub-step, in seconds.
    pub fixed_time_step: f32,
    /// Upper bound on sub-steps per `step_simulation` call. 0 = variable step.
    pub max_sub_steps: u32,
    /// Extrapolate motion states over the un-simulated remainder of a sub-step.
    pub interpolate: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -100.0, 0.0),
            fixed_time_step: 1.0 / 60.0,
            max_sub_steps: 10,
            interpolate: true,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidGravity(self.gravity));
        }
        if !self.fixed_time_step.is_finite() || self.fixed_time_step <= 0.0 {
            return Err(PhysicsError::InvalidFixedTimeStep(self.fixed_time_step));
        }
        Ok(())
    }
}

/// Handle to a body owned by a [`PhysicsWorld`].
///
/// Bodies are never removed, so handles stay valid for the world's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// What one `step_simulation` call actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    /// Engine sub-steps run.
    pub sub_steps: u32,
    /// Simulated time covered by those sub-steps.
    pub simulated_seconds: f32,
    /// Requested time thrown away because of the sub-step cap.
    pub dropped_seconds: f32,
}

struct BodyEntry {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    /// Last synchronized world transform.
    motion_state: Pose,
}

/// The physics world: engine pipeline plus every body added to it.
///
/// Stepping follows fixed-time-step accumulator semantics: requested time is
/// accumulated and consumed in whole `fixed_time_step` slices, never more than
/// `max_sub_steps` per call.
pub struct PhysicsWorld {
    config: WorldConfig,
    gravity: Vector3<f32>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    entries: Vec<BodyEntry>,
    /// Requested time not yet consumed by a whole sub-step.
    local_time: f32,
    elapsed: f64,
    total_sub_steps: u64,
}

impl PhysicsWorld {
    /// Build the engine pipeline and set gravity.
    pub fn new(config: WorldConfig) -> Result<Self, PhysicsError> {
        config.validate()?;
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.fixed_time_step;
        tracing::debug!(
            gravity = %config.gravity,
            fixed_time_step = config.fixed_time_step,
            max_sub_steps = config.max_sub_steps,
            "physics world created"
        );
        Ok(Self {
            config,
            gravity: to_vector(config.gravity),
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            entries: Vec::new(),
            local_time: 0.0,
            elapsed: 0.0,
            total_sub_steps: 0,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Number of bodies in the world.
    pub fn body_count(&self) -> usize {
        self.entries.len()
    }

    /// Total simulated time, in seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Total engine sub-steps run since creation.
    pub fn total_sub_steps(&self) -> u64 {
        self.total_sub_steps
    }

    /// Insert a configured body. The world owns it from here on.
    pub fn add_rigid_body(&mut self, body: RigidBody) -> BodyHandle {
        let (engine_body, collider) = body.build();
        let body_handle = self.bodies.insert(engine_body);
        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        let handle = BodyHandle(self.entries.len() as u32);
        self.entries.push(BodyEntry {
            body: body_handle,
            collider: collider_handle,
            motion_state: body.pose(),
        });
        tracing::trace!(%handle, shape = ?body.shape(), mass = body.mass(), "rigid body added");
        handle
    }

    /// Advance the simulation by `delta_seconds`.
    ///
    /// With `max_sub_steps > 0` the time is consumed in fixed sub-steps and
    /// anything beyond the cap is dropped. With `max_sub_steps == 0` one
    /// engine step of exactly `delta_seconds` is taken.
    pub fn step_simulation(
        &mut self,
        delta_seconds: f32,
        max_sub_steps: u32,
    ) -> Result<StepReport, PhysicsError> {
        if !delta_seconds.is_finite() || delta_seconds < 0.0 {
            return Err(PhysicsError::InvalidTimeStep(delta_seconds));
        }
        let _span = tracing::trace_span!("step_simulation", delta_seconds, max_sub_steps).entered();

        let mut report = StepReport::default();
        if max_sub_steps == 0 {
            if delta_seconds > 0.0 {
                self.integration_parameters.dt = delta_seconds;
                self.engine_step();
                self.integration_parameters.dt = self.config.fixed_time_step;
                report.sub_steps = 1;
                report.simulated_seconds = delta_seconds;
            }
            self.local_time = 0.0;
        } else {
            let fixed = self.config.fixed_time_step;
            self.local_time += delta_seconds;
            let mut wanted = 0u32;
            if self.local_time >= fixed {
                let (whole, remainder) = split_accumulator(self.local_time, fixed);
                self.local_time = remainder;
                wanted = whole;
            }
            let clamped = wanted.min(max_sub_steps);
            for _ in 0..clamped {
                self.engine_step();
            }
            report.sub_steps = clamped;
            report.simulated_seconds = clamped as f32 * fixed;
            report.dropped_seconds = (wanted - clamped) as f32 * fixed;
            if wanted > clamped {
                tracing::debug!(
                    wanted,
                    clamped,
                    dropped_seconds = report.dropped_seconds,
                    "sub-step cap reached, simulation falls behind"
                );
            }
        }

        self.elapsed += report.simulated_seconds as f64;
        self.synchronize_motion_states();
        Ok(report)
    }

    fn engine_step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
        self.total_sub_steps += 1;
    }

    /// Copy engine poses into motion states, extrapolated over `local_time`
    /// when interpolation is enabled.
    fn synchronize_motion_states(&mut self) {
        let lead = if self.config.interpolate {
            self.local_time
        } else {
            0.0
        };
        for entry in &mut self.entries {
            let Some(body) = self.bodies.get(entry.body) else {
                continue;
            };
            let pose = from_isometry(body.position());
            entry.motion_state = if lead > 0.0 && body.is_dynamic() {
                let linvel = from_vector(body.linvel());
                let angvel = from_vector(body.angvel());
                Pose::new(
                    pose.position + linvel * lead,
                    (Quat::from_scaled_axis(angvel * lead) * pose.rotation).normalize(),
                )
            } else {
                pose
            };
        }
    }

    fn entry(&self, handle: BodyHandle) -> Result<&BodyEntry, PhysicsError> {
        self.entries
            .get(handle.0 as usize)
            .ok_or(PhysicsError::UnknownBody(handle))
    }

    /// Motion-state read: the body's world transform as of the last step.
    pub fn world_transform(&self, handle: BodyHandle) -> Result<Pose, PhysicsError> {
        Ok(self.entry(handle)?.motion_state)
    }

    pub fn linear_velocity(&self, handle: BodyHandle) -> Result<Vec3, PhysicsError> {
        let entry = self.entry(handle)?;
        let body = self
            .bodies
            .get(entry.body)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        Ok(from_vector(body.linvel()))
    }

    pub fn is_static(&self, handle: BodyHandle) -> Result<bool, PhysicsError> {
        let entry = self.entry(handle)?;
        let body = self
            .bodies
            .get(entry.body)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        Ok(body.is_fixed())
    }

    pub fn restitution(&self, handle: BodyHandle) -> Result<f32, PhysicsError> {
        let entry = self.entry(handle)?;
        self.colliders
            .get(entry.collider)
            .map(|c| c.restitution())
            .ok_or(PhysicsError::UnknownBody(handle))
    }

    pub fn set_restitution(&mut self, handle: BodyHandle, value: f32) -> Result<(), PhysicsError> {
        let value = check_coefficient("restitution", value)?;
        let collider = self.entry(handle)?.collider;
        let collider = self
            .colliders
            .get_mut(collider)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        collider.set_restitution(value);
        Ok(())
    }

    pub fn friction(&self, handle: BodyHandle) -> Result<f32, PhysicsError> {
        let entry = self.entry(handle)?;
        self.colliders
            .get(entry.collider)
            .map(|c| c.friction())
            .ok_or(PhysicsError::UnknownBody(handle))
    }

    pub fn set_friction(&mut self, handle: BodyHandle, value: f32) -> Result<(), PhysicsError> {
        let value = check_coefficient("friction", value)?;
        let collider = self.entry(handle)?.collider;
        let collider = self
            .colliders
            .get_mut(collider)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        collider.set_friction(value);
        Ok(())
    }

    pub fn rolling_friction(&self, handle: BodyHandle) -> Result<f32, PhysicsError> {
        let entry = self.entry(handle)?;
        self.bodies
            .get(entry.body)
            .map(|b| b.angular_damping())
            .ok_or(PhysicsError::UnknownBody(handle))
    }

    pub fn set_rolling_friction(
        &mut self,
        handle: BodyHandle,
        value: f32,
    ) -> Result<(), PhysicsError> {
        let value = check_coefficient("rolling friction", value)?;
        let body = self.entry(handle)?.body;
        let body = self
            .bodies
            .get_mut(body)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        body.set_angular_damping(value);
        Ok(())
    }
}

/// Split accumulated time into whole sub-steps and a remainder in `[0, fixed)`.
///
/// f32 rounding on huge accumulators can leave a remainder of one step or
/// more; that remainder is discarded.
fn split_accumulator(accumulated: f32, fixed: f32) -> (u32, f32) {
    let acc = accumulated as f64;
    let step = fixed as f64;
    let whole = (acc / step).floor();
    let remainder = (acc - whole * step) as f32;
    let remainder = if (0.0..fixed).contains(&remainder) {
        remainder
    } else {
        0.0
    };
    (whole.min(u32::MAX as f64) as u32, remainder)
}
