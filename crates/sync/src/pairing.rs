use serde::{Deserialize, Serialize};
use tumble_physics::{BodyHandle, PhysicsWorld};
use tumble_scene::{MeshId, SceneGraph};

use crate::error::SyncError;

/// A render mesh driven by a rigid body. Owns neither half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhysicsObject {
    pub mesh: MeshId,
    pub body: BodyHandle,
}

impl PhysicsObject {
    pub fn new(mesh: MeshId, body: BodyHandle) -> Self {
        Self { mesh, body }
    }
}

/// Copy each body's world transform onto its mesh, in slice order.
///
/// Position and rotation are overwritten; mesh scale is left alone. Stops at
/// the first pairing whose body or mesh is missing. Returns the number of
/// meshes updated.
pub fn sync_transforms(
    physics: &PhysicsWorld,
    scene: &mut SceneGraph,
    objects: &[PhysicsObject],
) -> Result<usize, SyncError> {
    for obj in objects {
        let pose = physics.world_transform(obj.body)?;
        scene.set_pose(obj.mesh, pose)?;
    }
    tracing::trace!(count = objects.len(), "transforms synced");
    Ok(objects.len())
}
