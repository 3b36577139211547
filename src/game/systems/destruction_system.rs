//! Destruction lifecycle system.
//!
//! Owns breakable targets and their debris: seeding, remote spawns,
//! breaking (locally or by replay), snapshot replacement and debris expiry.
//!
//! Broken target ids are tombstoned for the rest of the session, so a late
//! `spawn-target` or `full-sync` from a peer that has not yet seen the break
//! cannot bring a target back.

use std::collections::HashSet;

use glam::{Quat, Vec3};
use rand::Rng;
use tracing::debug;

use crate::game::config::DestructionConfig;
use crate::game::destruction::{FragmentShape, plan_debris};
use crate::game::entities::{EntityId, EntityKind};
use crate::game::state::{FaultKind, SimWorld};
use crate::net::{BreakTargetPayload, TargetId, TargetSnapshot};
use crate::physics::{CollisionGroups, RigidBody, Shape};
use crate::render::{NodeDesc, NodeKind};
use crate::time::Millis;

/// Length of generated target ids.
pub const TARGET_ID_LEN: usize = 9;

/// Attempts at moving a seeded target away from its neighbours.
const MAX_SPACING_NUDGES: usize = 8;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random base-36 target id.
pub fn generate_target_id(rng: &mut impl Rng) -> TargetId {
    let id: String = (0..TARGET_ID_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    TargetId::new(id)
}

#[derive(Debug, Clone)]
struct LiveTarget {
    id: TargetId,
    entity: EntityId,
}

#[derive(Debug, Clone, Copy)]
struct LiveDebris {
    entity: EntityId,
    spawned_at: Millis,
}

/// Manages breakable targets and debris fragments.
pub struct DestructionSystem {
    config: DestructionConfig,
    target_color: [f32; 3],
    debris_color: [f32; 3],
    /// Insertion order is the snapshot order
    targets: Vec<LiveTarget>,
    tombstones: HashSet<TargetId>,
    debris: Vec<LiveDebris>,
    has_world_state: bool,
}

impl DestructionSystem {
    pub fn new(config: DestructionConfig, target_color: [f32; 3], debris_color: [f32; 3]) -> Self {
        Self {
            config,
            target_color,
            debris_color,
            targets: Vec::new(),
            tombstones: HashSet::new(),
            debris: Vec::new(),
            has_world_state: false,
        }
    }

    /// Create the initial target set. Returns what was created.
    pub fn seed_targets(&mut self, world: &mut SimWorld) -> Vec<TargetSnapshot> {
        let extent = self.config.seed_extent;
        let spacing = self.config.min_target_spacing;
        let mut placed: Vec<Vec3> = Vec::with_capacity(self.config.seed_count);
        let mut created = Vec::with_capacity(self.config.seed_count);

        for _ in 0..self.config.seed_count {
            let mut position = Vec3::new(
                world.rng.random::<f32>() * extent * 2.0 - extent,
                self.config.seed_height,
                world.rng.random::<f32>() * extent * 2.0 - extent,
            );
            for _ in 0..MAX_SPACING_NUDGES {
                if !placed.iter().any(|p| p.distance(position) < spacing) {
                    break;
                }
                position.x += spacing * (world.rng.random::<f32>() - 0.5);
                position.z += spacing * (world.rng.random::<f32>() - 0.5);
            }
            placed.push(position);

            let snapshot = TargetSnapshot {
                id: generate_target_id(&mut world.rng),
                position,
            };
            if self.spawn_target(world, &snapshot) {
                created.push(snapshot);
            }
        }

        debug!(count = created.len(), "seeded breakable targets");
        self.has_world_state = true;
        created
    }

    /// Add a target announced by a peer (or by seeding).
    ///
    /// Ignores ids that are already live or tombstoned.
    pub fn spawn_target(&mut self, world: &mut SimWorld, target: &TargetSnapshot) -> bool {
        if self.tombstones.contains(&target.id) {
            debug!(id = %target.id, "ignoring spawn of a broken target");
            return false;
        }
        if self.is_live(&target.id) {
            world.fault(FaultKind::DuplicateEvent, "target already exists");
            return false;
        }

        let size = self.config.target_size;
        let body = RigidBody::dynamic(Shape::cube(size), self.config.target_mass)
            .with_position(target.position)
            .with_damping(self.config.target_damping, self.config.target_damping)
            .with_filter(
                CollisionGroups::BREAKABLE,
                CollisionGroups::GROUND
                    | CollisionGroups::CHARACTER
                    | CollisionGroups::PROJECTILE
                    | CollisionGroups::DEBRIS,
            );
        let node = NodeDesc::new(NodeKind::Cuboid {
            size: Vec3::splat(size),
        })
        .at(target.position)
        .colored(self.target_color);

        let (entity, _) = world.spawn(
            EntityKind::BreakableTarget(target.id.clone()),
            body,
            Some(node),
        );
        self.targets.push(LiveTarget {
            id: target.id.clone(),
            entity,
        });
        self.has_world_state = true;
        true
    }

    /// Break a live target hit at `impact`.
    ///
    /// Spawns the debris burst, removes the target and tombstones its id.
    /// Returns the payload to broadcast, or `None` if the target was
    /// already gone.
    pub fn break_target(
        &mut self,
        world: &mut SimWorld,
        id: &TargetId,
        impact: Vec3,
    ) -> Option<BreakTargetPayload> {
        let Some(index) = self.targets.iter().position(|t| &t.id == id) else {
            let fault = if self.tombstones.contains(id) {
                FaultKind::DuplicateEvent
            } else {
                FaultKind::StaleReference
            };
            world.fault(fault, "break for a target that is not live");
            return None;
        };
        let target = self.targets.remove(index);

        let position = world
            .entities
            .get(target.entity)
            .and_then(|record| world.physics.get(record.body))
            .map(|body| body.position)
            .unwrap_or(impact);

        self.spawn_debris(world, position, impact);
        world.despawn(target.entity);
        self.tombstones.insert(target.id.clone());
        world.stats.targets_broken += 1;
        debug!(id = %target.id, "target broken");

        Some(BreakTargetPayload {
            id: target.id,
            position,
            broken: true,
            impact_point: impact,
        })
    }

    fn spawn_debris(&mut self, world: &mut SimWorld, center: Vec3, impact: Vec3) {
        let fragments = plan_debris(&mut world.rng, center, impact, &self.config);
        for fragment in fragments {
            let body = RigidBody::dynamic(Shape::cube(fragment.size), self.config.debris_mass)
                .with_position(fragment.position)
                .with_damping(self.config.debris_damping, self.config.debris_damping)
                .with_filter(
                    CollisionGroups::DEBRIS,
                    CollisionGroups::GROUND | CollisionGroups::BREAKABLE | CollisionGroups::DEBRIS,
                );
            let kind = match fragment.shape {
                FragmentShape::Tetrahedron => NodeKind::Tetrahedron {
                    size: fragment.size,
                },
                FragmentShape::Cube => NodeKind::Cuboid {
                    size: Vec3::splat(fragment.size),
                },
            };
            let node = NodeDesc::new(kind)
                .at(fragment.position)
                .rotated(Quat::IDENTITY)
                .colored(self.debris_color);

            let (entity, handle) = world.spawn(EntityKind::Debris, body, Some(node));
            world.physics.apply_impulse(handle, fragment.impulse);
            if let Some(body) = world.physics.get_mut(handle) {
                body.angular_velocity = fragment.angular_velocity;
            }
            self.debris.push(LiveDebris {
                entity,
                spawned_at: world.now,
            });
        }
    }

    /// Replace the whole local target list with a received snapshot.
    ///
    /// Tombstoned ids in the snapshot are skipped. Returns targets spawned.
    pub fn apply_snapshot(&mut self, world: &mut SimWorld, snapshot: &[TargetSnapshot]) -> usize {
        for target in self.targets.drain(..) {
            world.despawn(target.entity);
        }
        let spawned = snapshot
            .iter()
            .filter(|t| self.spawn_target(world, t))
            .count();
        self.has_world_state = true;
        world.stats.snapshots_applied += 1;
        debug!(
            received = snapshot.len(),
            spawned, "applied target snapshot"
        );
        spawned
    }

    /// Current unbroken targets, in creation order.
    pub fn snapshot(&self, world: &SimWorld) -> Vec<TargetSnapshot> {
        self.targets
            .iter()
            .filter_map(|t| {
                let record = world.entities.get(t.entity)?;
                let body = world.physics.get(record.body)?;
                Some(TargetSnapshot {
                    id: t.id.clone(),
                    position: body.position,
                })
            })
            .collect()
    }

    /// Remove debris older than the configured lifetime.
    pub fn expire_debris(&mut self, world: &mut SimWorld, now: Millis) -> usize {
        let ttl = self.config.debris_ttl_ms;
        let mut expired = 0;
        self.debris.retain(|d| {
            if now.saturating_sub(d.spawned_at) >= ttl {
                world.despawn(d.entity);
                expired += 1;
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn is_live(&self, id: &TargetId) -> bool {
        self.targets.iter().any(|t| &t.id == id)
    }

    pub fn is_tombstoned(&self, id: &TargetId) -> bool {
        self.tombstones.contains(id)
    }

    pub fn target_entity(&self, id: &TargetId) -> Option<EntityId> {
        self.targets.iter().find(|t| &t.id == id).map(|t| t.entity)
    }

    pub fn target_ids(&self) -> impl Iterator<Item = &TargetId> {
        self.targets.iter().map(|t| &t.id)
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn debris_count(&self) -> usize {
        self.debris.len()
    }

    /// Seeded, or received targets from a peer.
    pub fn has_world_state(&self) -> bool {
        self.has_world_state
    }

    /// Release all targets and debris and forget tombstones.
    pub fn clear(&mut self, world: &mut SimWorld) {
        for target in self.targets.drain(..) {
            world.despawn(target.entity);
        }
        for debris in self.debris.drain(..) {
            world.despawn(debris.entity);
        }
        self.tombstones.clear();
        self.has_world_state = false;
    }
}
