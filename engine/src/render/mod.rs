//! Rendering collaborator
//!
//! The engine does not draw anything itself. It describes visual nodes
//! through the [`SceneGraph`] trait and writes transforms into it once per
//! frame (physics → visual, never the reverse). A host renderer implements
//! the trait; [`HeadlessScene`] keeps the same bookkeeping in memory.

pub mod headless;

use glam::{Quat, Vec3};

pub use headless::{HeadlessNode, HeadlessScene};

/// Opaque handle to a node in the host scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(pub u64);

/// What a node looks like.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Loaded model (character)
    Model { asset: String },
    Sphere { radius: f32 },
    Cuboid { size: Vec3 },
    Tetrahedron { size: f32 },
    Cylinder { radius: f32, height: f32 },
    /// Horizontal ground plane of `size` × `size`
    Plane { size: f32 },
}

/// Everything needed to create a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDesc {
    pub kind: NodeKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Linear RGB
    pub color: [f32; 3],
    /// Floating name label rendered above the node
    pub label: Option<String>,
}

impl NodeDesc {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            color: [1.0, 1.0, 1.0],
            label: None,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn rotated(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scaled(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn colored(mut self, color: [f32; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Host scene graph. Unknown handles are ignored (`false`).
pub trait SceneGraph {
    fn add_node(&mut self, desc: NodeDesc) -> VisualHandle;

    /// Remove a node and free whatever the host attached to it.
    fn remove_node(&mut self, handle: VisualHandle) -> bool;

    fn set_transform(&mut self, handle: VisualHandle, position: Vec3, rotation: Quat) -> bool;

    fn set_scale(&mut self, handle: VisualHandle, scale: Vec3) -> bool;

    /// Cross-fade the node's model to `clip`.
    fn play_animation(&mut self, handle: VisualHandle, clip: &str) -> bool;

    fn node_position(&self, handle: VisualHandle) -> Option<Vec3>;

    fn node_count(&self) -> usize;
}
