//! Entity Registry
//!
//! Single owner of the entity ↔ physics body ↔ visual node mapping. The
//! registry is owned by the scene and passed by reference to every system;
//! there is no global entity table.
//!
//! Visual transforms are written from physics here, once per frame. The
//! only writes in the other direction (local character velocity, remote
//! kinematic placement) go straight to the physics world.

use std::collections::{BTreeMap, HashMap};

use glam::{Quat, Vec3};

use crate::net::{PeerId, TargetId};
use crate::physics::types::yaw_rotation;
use crate::physics::{BodyHandle, PhysicsWorld};
use crate::render::{SceneGraph, VisualHandle};
use crate::time::Millis;

/// Unique id of a live entity within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

/// What an entity is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    Ground,
    LocalCharacter,
    RemoteCharacter(PeerId),
    Projectile,
    BreakableTarget(TargetId),
    Debris,
    StaticProp,
    Button,
}

impl EntityKind {
    pub fn is_character(&self) -> bool {
        matches!(self, EntityKind::LocalCharacter | EntityKind::RemoteCharacter(_))
    }
}

/// Book-keeping for one live entity.
#[derive(Debug, Clone)]
pub struct EntityRecord {
    pub id: EntityId,
    pub kind: EntityKind,
    pub body: BodyHandle,
    pub visual: Option<VisualHandle>,
    pub created_at: Millis,
    /// Added to the body position when placing the visual
    pub visual_offset: Vec3,
    /// Characters are drawn with this yaw instead of the body orientation
    pub facing_yaw: Option<f32>,
}

/// Owner of all live entities.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    next_id: u64,
    entities: BTreeMap<EntityId, EntityRecord>,
    by_body: HashMap<BodyHandle, EntityId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity around an existing body (and optional visual).
    pub fn spawn(
        &mut self,
        kind: EntityKind,
        body: BodyHandle,
        visual: Option<VisualHandle>,
        now: Millis,
    ) -> EntityId {
        self.next_id += 1;
        let id = EntityId(self.next_id);
        let facing_yaw = kind.is_character().then_some(0.0);
        self.entities.insert(
            id,
            EntityRecord {
                id,
                kind,
                body,
                visual,
                created_at: now,
                visual_offset: Vec3::ZERO,
                facing_yaw,
            },
        );
        self.by_body.insert(body, id);
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Entity owning `body`, if any.
    pub fn by_body(&self, body: BodyHandle) -> Option<EntityId> {
        self.by_body.get(&body).copied()
    }

    pub fn kind_of_body(&self, body: BodyHandle) -> Option<&EntityKind> {
        self.by_body(body)
            .and_then(|id| self.entities.get(&id))
            .map(|r| &r.kind)
    }

    pub fn set_facing(&mut self, id: EntityId, yaw: f32) {
        if let Some(record) = self.entities.get_mut(&id) {
            record.facing_yaw = Some(yaw);
        }
    }

    /// Remove an entity and release its body and visual node.
    ///
    /// Returns `None` when the entity was already gone.
    pub fn despawn(
        &mut self,
        id: EntityId,
        physics: &mut PhysicsWorld,
        scene: &mut dyn SceneGraph,
    ) -> Option<EntityRecord> {
        let record = self.entities.remove(&id)?;
        self.by_body.remove(&record.body);
        physics.remove_body(record.body);
        if let Some(visual) = record.visual {
            scene.remove_node(visual);
        }
        Some(record)
    }

    /// Despawn everything. Returns how many entities were released.
    pub fn despawn_all(&mut self, physics: &mut PhysicsWorld, scene: &mut dyn SceneGraph) -> usize {
        let ids: Vec<EntityId> = self.entities.keys().copied().collect();
        ids.into_iter()
            .filter(|id| self.despawn(*id, physics, scene).is_some())
            .count()
    }

    /// Copy body transforms onto visual nodes. Returns nodes updated.
    pub fn sync_visuals(&self, physics: &PhysicsWorld, scene: &mut dyn SceneGraph) -> usize {
        let mut updated = 0;
        for record in self.entities.values() {
            let (Some(visual), Some(body)) = (record.visual, physics.get(record.body)) else {
                continue;
            };
            let rotation: Quat = match record.facing_yaw {
                Some(yaw) => yaw_rotation(yaw),
                None => body.orientation,
            };
            if scene.set_transform(visual, body.position + record.visual_offset, rotation) {
                updated += 1;
            }
        }
        updated
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn count_where(&self, pred: impl Fn(&EntityKind) -> bool) -> usize {
        self.entities.values().filter(|r| pred(&r.kind)).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entities.values()
    }
}
