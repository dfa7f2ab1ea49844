use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::graph::{Geometry, SceneGraph};

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(-75.0, 75.0, 25.0),
            target: Vec3::ZERO,
            fov_degrees: 60.0,
        }
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene graph and a view configuration, then produces
/// output. It never mutates the scene; the synchronization loop owns that.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and view.
    fn render(&self, scene: &SceneGraph, view: &RenderView) -> Self::Output;
}

/// Text renderer: one line per mesh with its world-space pose.
///
/// Used for headless runs, logging, and testing the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Stop listing meshes after this many; 0 lists all.
    pub max_meshes: usize,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_meshes(max_meshes: usize) -> Self {
        Self { max_meshes }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &SceneGraph, view: &RenderView) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Scene ({} meshes) ===", scene.len());
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.target.x,
            view.target.y,
            view.target.z,
            view.fov_degrees
        );

        for (id, node) in scene.iter() {
            if self.max_meshes > 0 && id.0 as usize >= self.max_meshes {
                let _ = writeln!(out, "  ... {} more", scene.len() - self.max_meshes);
                break;
            }
            // Nodes come from the graph itself, so the lookup cannot miss.
            let Ok(t) = scene.world_transform(id) else {
                continue;
            };
            let kind = match node.geometry {
                Geometry::Box { .. } => "box",
                Geometry::Sphere { .. } => "sphere",
                Geometry::Plane { .. } => "plane",
            };
            let p = t.position;
            let r = t.rotation;
            let _ = writeln!(
                out,
                "  [{id}] {kind:<6} {} pos=({:.2}, {:.2}, {:.2}) rot=({:.3}, {:.3}, {:.3}, {:.3})",
                node.name, p.x, p.y, p.z, r.x, r.y, r.z, r.w
            );
        }

        out
    }
}
