//! In-memory scene graph
//!
//! Stores node descriptions and the last transform/animation written to
//! each, without drawing. Used by tests and the headless session binary.

use std::collections::HashMap;

use glam::{Quat, Vec3};

use super::{NodeDesc, SceneGraph, VisualHandle};

/// A stored node.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessNode {
    pub desc: NodeDesc,
    pub animation: Option<String>,
}

#[derive(Debug, Default)]
pub struct HeadlessScene {
    nodes: HashMap<VisualHandle, HeadlessNode>,
    next_id: u64,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, handle: VisualHandle) -> Option<&HeadlessNode> {
        self.nodes.get(&handle)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (VisualHandle, &HeadlessNode)> {
        self.nodes.iter().map(|(h, n)| (*h, n))
    }
}

impl SceneGraph for HeadlessScene {
    fn add_node(&mut self, desc: NodeDesc) -> VisualHandle {
        self.next_id += 1;
        let handle = VisualHandle(self.next_id);
        self.nodes.insert(
            handle,
            HeadlessNode {
                desc,
                animation: None,
            },
        );
        handle
    }

    fn remove_node(&mut self, handle: VisualHandle) -> bool {
        self.nodes.remove(&handle).is_some()
    }

    fn set_transform(&mut self, handle: VisualHandle, position: Vec3, rotation: Quat) -> bool {
        match self.nodes.get_mut(&handle) {
            Some(node) => {
                node.desc.position = position;
                node.desc.rotation = rotation;
                true
            }
            None => false,
        }
    }

    fn set_scale(&mut self, handle: VisualHandle, scale: Vec3) -> bool {
        match self.nodes.get_mut(&handle) {
            Some(node) => {
                node.desc.scale = scale;
                true
            }
            None => false,
        }
    }

    fn play_animation(&mut self, handle: VisualHandle, clip: &str) -> bool {
        match self.nodes.get_mut(&handle) {
            Some(node) => {
                node.animation = Some(clip.to_string());
                true
            }
            None => false,
        }
    }

    fn node_position(&self, handle: VisualHandle) -> Option<Vec3> {
        self.nodes.get(&handle).map(|n| n.desc.position)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::NodeKind;

    #[test]
    fn test_add_move_remove() {
        let mut scene = HeadlessScene::new();
        let h = scene.add_node(NodeDesc::new(NodeKind::Sphere { radius: 0.3 }));
        assert!(scene.set_transform(h, Vec3::ONE, Quat::IDENTITY));
        assert_eq!(scene.node_position(h), Some(Vec3::ONE));
        assert!(scene.remove_node(h));
        assert!(!scene.remove_node(h));
        assert!(!scene.set_scale(h, Vec3::ONE), "stale handle is ignored");
        assert_eq!(scene.node_count(), 0);
    }
}
