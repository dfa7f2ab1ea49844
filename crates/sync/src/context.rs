use glam::{Quat, Vec3};
use tumble_common::Transform;
use tumble_physics::{
    BodyHandle, PhysicsError, PhysicsWorld, RigidBody, StepReport, WorldConfig,
};
use tumble_scene::{Geometry, Material, MeshId, MeshNode, RenderView, SceneGraph};

use crate::clock::FrameClock;
use crate::config::{LayoutConfig, SceneConfig, SpawnerConfig};
use crate::error::SyncError;
use crate::pairing::{PhysicsObject, sync_transforms};
use crate::rng::SplitMix64;
use crate::spawner::Spawner;

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// 1-based frame number.
    pub frame: u64,
    pub delta_seconds: f32,
    pub step: StepReport,
    /// Meshes updated from their bodies.
    pub synced: usize,
    pub spawned: Option<PhysicsObject>,
}

/// Owner of the physics world, the scene graph and the pairings between them.
///
/// Built in a fixed order: physics world, scene graph, static ground,
/// initial layout, spawner.
pub struct AppContext {
    physics: PhysicsWorld,
    scene: SceneGraph,
    objects: Vec<PhysicsObject>,
    clock: FrameClock,
    spawner: Spawner,
    view: RenderView,
    max_sub_steps: u32,
    frames: u64,
}

impl AppContext {
    /// Build the full scene described by `config`.
    pub fn new(config: &SceneConfig) -> Result<Self, SyncError> {
        let _span = tracing::info_span!("scene_setup").entered();
        config.validate()?;

        let mut ctx = Self::with_spawner(config.world, Spawner::new(config.spawner))?;
        ctx.view = config.view;

        let ground = &config.ground;
        ctx.add_static(
            ground.body()?,
            MeshNode::new(
                "ground",
                Geometry::Box { size: ground.size },
                Material {
                    color: ground.color,
                },
            )
            .with_transform(Transform {
                position: ground.position,
                ..Transform::default()
            })
            .with_shadows(false, true),
        )?;

        ctx.add_layout(&config.layout)?;
        tracing::info!(
            bodies = ctx.physics.body_count(),
            meshes = ctx.scene.len(),
            pairings = ctx.objects.len(),
            "scene ready"
        );
        Ok(ctx)
    }

    /// A world with nothing in it and the spawner switched off.
    pub fn empty(world: WorldConfig) -> Result<Self, SyncError> {
        Self::with_spawner(
            world,
            Spawner::new(SpawnerConfig {
                enabled: false,
                ..SpawnerConfig::default()
            }),
        )
    }

    fn with_spawner(world: WorldConfig, spawner: Spawner) -> Result<Self, SyncError> {
        let physics = PhysicsWorld::new(world)?;
        Ok(Self {
            physics,
            scene: SceneGraph::new(),
            objects: Vec::new(),
            clock: FrameClock::new(),
            spawner,
            view: RenderView::default(),
            max_sub_steps: world.max_sub_steps,
            frames: 0,
        })
    }

    /// Add a body with a mesh that stays where it was placed. No pairing is made.
    pub fn add_static(
        &mut self,
        body: RigidBody,
        node: MeshNode,
    ) -> Result<(MeshId, BodyHandle), SyncError> {
        let handle = self.physics.add_rigid_body(body);
        let mesh = self.scene.add(node);
        // Place the mesh exactly where the engine holds the body.
        self.scene.set_pose(mesh, self.physics.world_transform(handle)?)?;
        Ok((mesh, handle))
    }

    /// Add a body and a mesh, and pair them so the mesh follows the body.
    pub fn add_physics_object(
        &mut self,
        body: RigidBody,
        node: MeshNode,
    ) -> Result<PhysicsObject, SyncError> {
        let handle = self.physics.add_rigid_body(body);
        let mesh = self.scene.add(node);
        self.scene.set_pose(mesh, self.physics.world_transform(handle)?)?;
        let obj = PhysicsObject::new(mesh, handle);
        self.objects.push(obj);
        Ok(obj)
    }

    fn add_layout(&mut self, layout: &LayoutConfig) -> Result<(), SyncError> {
        if !layout.enabled {
            return Ok(());
        }
        let mut rng = SplitMix64::new(layout.seed);
        // The first cell is a sphere; after each cell the shape flips with probability 1/2.
        let mut is_sphere = true;
        for i in layout.grid_min..layout.grid_max {
            for j in layout.grid_min..layout.grid_max {
                let position = Vec3::new(
                    i as f32 * layout.spacing,
                    layout.drop_height + rng.range(0.0, layout.drop_jitter),
                    j as f32 * layout.spacing,
                );
                let material = Material { color: rng.color() };
                let (body, geometry) = if is_sphere {
                    let r = layout.sphere_radius;
                    let mut body = RigidBody::create_sphere(layout.sphere.mass, position, r)?;
                    layout.sphere.apply(&mut body)?;
                    (body, Geometry::Sphere { radius: r })
                } else {
                    let size = Vec3::splat(layout.box_size);
                    let mut body =
                        RigidBody::create_box(layout.cube.mass, position, Quat::IDENTITY, size)?;
                    layout.cube.apply(&mut body)?;
                    (body, Geometry::Box { size })
                };
                let node = MeshNode::new(format!("layout-{i}-{j}"), geometry, material)
                    .with_transform(Transform {
                        position,
                        ..Transform::default()
                    });
                self.add_physics_object(body, node)?;
                if rng.next_f32() < 0.5 {
                    is_sphere = !is_sphere;
                }
            }
        }
        tracing::debug!(count = layout.object_count(), "layout placed");
        Ok(())
    }

    /// Advance the scene by `delta_seconds`: spawn, step, then sync.
    ///
    /// A negative or non-finite delta is rejected before anything changes.
    pub fn step(&mut self, delta_seconds: f32) -> Result<FrameReport, SyncError> {
        if !delta_seconds.is_finite() || delta_seconds < 0.0 {
            return Err(PhysicsError::InvalidTimeStep(delta_seconds).into());
        }
        self.frames += 1;
        let frame = self.frames;
        let _span = tracing::info_span!("frame", frame).entered();
        let spawned = match self.spawner.tick(delta_seconds)? {
            Some(req) => Some(self.add_physics_object(req.body, req.node)?),
            None => None,
        };
        let step = self
            .physics
            .step_simulation(delta_seconds, self.max_sub_steps)?;
        let synced = sync_transforms(&self.physics, &mut self.scene, &self.objects)?;
        Ok(FrameReport {
            frame,
            delta_seconds,
            step,
            synced,
            spawned,
        })
    }

    /// Run one frame stamped `timestamp_ms`.
    pub fn frame(&mut self, timestamp_ms: f64) -> Result<FrameReport, SyncError> {
        let delta = self.clock.tick(timestamp_ms);
        self.step(delta)
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Pairings in the order they are synced.
    pub fn objects(&self) -> &[PhysicsObject] {
        &self.objects
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    /// Frames stepped so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn view(&self) -> &RenderView {
        &self.view
    }
}
