use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use tumble_common::{Pose, Transform};

/// Index of a node in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshId(pub u32);

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

/// Renderable geometry, in the node's local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Box { size: Vec3 },
    Sphere { radius: f32 },
    /// Horizontal plane through the origin.
    Plane { width: f32, depth: f32 },
}

/// Flat surface material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    /// 0xRRGGBB.
    pub color: u32,
}

impl Default for Material {
    fn default() -> Self {
        Self { color: 0xcccccc }
    }
}

/// One mesh in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub name: String,
    pub geometry: Geometry,
    pub material: Material,
    /// Local transform (relative to the parent, if any).
    pub transform: Transform,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    parent: Option<MeshId>,
}

impl MeshNode {
    pub fn new(name: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self {
            name: name.into(),
            geometry,
            material,
            transform: Transform::default(),
            cast_shadow: true,
            receive_shadow: true,
            parent: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }

    pub fn parent(&self) -> Option<MeshId> {
        self.parent
    }
}

/// Errors from scene graph operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("mesh {0} not found")]
    UnknownMesh(MeshId),
}

/// Arena of mesh nodes addressed by [`MeshId`].
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<MeshNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a root node.
    pub fn add(&mut self, mut node: MeshNode) -> MeshId {
        node.parent = None;
        self.push(node)
    }

    /// Add a node whose transform is relative to `parent`.
    pub fn add_child(&mut self, parent: MeshId, mut node: MeshNode) -> Result<MeshId, SceneError> {
        self.get(parent)?;
        node.parent = Some(parent);
        Ok(self.push(node))
    }

    fn push(&mut self, node: MeshNode) -> MeshId {
        let id = MeshId(self.nodes.len() as u32);
        tracing::trace!(%id, name = %node.name, "mesh added");
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: MeshId) -> Result<&MeshNode, SceneError> {
        self.nodes
            .get(id.0 as usize)
            .ok_or(SceneError::UnknownMesh(id))
    }

    pub fn get_mut(&mut self, id: MeshId) -> Result<&mut MeshNode, SceneError> {
        self.nodes
            .get_mut(id.0 as usize)
            .ok_or(SceneError::UnknownMesh(id))
    }

    /// Overwrite the node's local position and rotation. Scale is kept.
    pub fn set_pose(&mut self, id: MeshId, pose: Pose) -> Result<(), SceneError> {
        self.get_mut(id)?.transform.set_pose(pose);
        Ok(())
    }

    /// Transform of the node in world space, composed up the parent chain.
    pub fn world_transform(&self, id: MeshId) -> Result<Transform, SceneError> {
        let node = self.get(id)?;
        let mut transform = node.transform;
        let mut parent = node.parent;
        while let Some(pid) = parent {
            let p = self.get(pid)?;
            transform = p.transform.mul_transform(&transform);
            parent = p.parent;
        }
        Ok(transform)
    }

    /// All nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (MeshId, &MeshNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (MeshId(i as u32), n))
    }
}
