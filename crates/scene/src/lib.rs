//! Scene graph: render meshes, their transforms, and a renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read the scene graph; they never mutate it.
//! - Node ids are stable for the graph's lifetime (nodes are never removed).
//! - A node's parent is always added before the node itself.

mod graph;
mod renderer;

pub use graph::{Geometry, Material, MeshId, MeshNode, SceneError, SceneGraph};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    "tumble-scene v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("scene"));
    }
}
