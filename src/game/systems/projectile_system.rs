//! Projectile lifecycle management system.
//!
//! Owns the throw cooldown and the list of live projectiles. Throws become
//! dynamic sphere bodies; hits are read from the previous step's contacts
//! and handed back to the caller so destruction stays in its own system.

use std::collections::HashSet;

use glam::Vec3;

use crate::game::config::ProjectileConfig;
use crate::game::entities::{EntityId, EntityKind};
use crate::game::state::{FaultKind, SimWorld};
use crate::net::{TargetId, ThrowPayload};
use crate::physics::{BodyHandle, CollisionGroups, Contact, RigidBody, Shape};
use crate::render::{NodeDesc, NodeKind};
use crate::time::{Cooldown, Millis};

#[derive(Debug, Clone, Copy)]
struct LiveProjectile {
    entity: EntityId,
    body: BodyHandle,
    spawned_at: Millis,
}

/// A projectile touched something during the last step.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileHit {
    pub projectile: EntityId,
    /// Set when the other body is a breakable target
    pub target: Option<TargetId>,
    pub point: Vec3,
}

/// Manages throwing, hit collection and expiry of projectiles.
pub struct ProjectileSystem {
    config: ProjectileConfig,
    color: [f32; 3],
    cooldown: Cooldown,
    projectiles: Vec<LiveProjectile>,
}

impl ProjectileSystem {
    pub fn new(config: ProjectileConfig, color: [f32; 3]) -> Self {
        let cooldown = Cooldown::new(config.cooldown_ms);
        Self {
            config,
            color,
            cooldown,
            projectiles: Vec::new(),
        }
    }

    /// Throw from a character at `origin` facing `facing`.
    ///
    /// Returns the payload to broadcast, or `None` while on cooldown.
    pub fn try_throw(
        &mut self,
        world: &mut SimWorld,
        origin: Vec3,
        facing: Vec3,
        now: Millis,
    ) -> Option<ThrowPayload> {
        if !self.cooldown.try_fire(now) {
            return None;
        }
        let direction = facing.try_normalize().unwrap_or(Vec3::NEG_Z);
        let payload = ThrowPayload {
            position: origin
                + direction * self.config.spawn_forward
                + Vec3::new(0.0, self.config.spawn_up, 0.0),
            direction,
            velocity: self.config.speed,
        };
        self.spawn(world, &payload);
        world.stats.projectiles_thrown += 1;
        Some(payload)
    }

    /// Create a projectile body. Used for local throws and remote replays.
    pub fn spawn(&mut self, world: &mut SimWorld, throw: &ThrowPayload) -> EntityId {
        let direction = throw.direction.try_normalize().unwrap_or(Vec3::NEG_Z);
        let velocity = direction * throw.velocity + Vec3::new(0.0, self.config.upward_bias, 0.0);
        let radius = self.config.radius;

        let body = RigidBody::dynamic(Shape::Sphere { radius }, self.config.mass)
            .with_position(throw.position)
            .with_velocity(velocity)
            .with_damping(self.config.damping, self.config.damping)
            .with_filter(
                CollisionGroups::PROJECTILE,
                CollisionGroups::GROUND | CollisionGroups::BREAKABLE | CollisionGroups::CHARACTER,
            );
        let node = NodeDesc::new(NodeKind::Sphere { radius })
            .at(throw.position)
            .colored(self.color);

        let (entity, body) = world.spawn(EntityKind::Projectile, body, Some(node));
        self.projectiles.push(LiveProjectile {
            entity,
            body,
            spawned_at: world.now,
        });
        entity
    }

    pub fn find_by_body(&self, body: BodyHandle) -> Option<EntityId> {
        self.projectiles
            .iter()
            .find(|p| p.body == body)
            .map(|p| p.entity)
    }

    /// Hits recorded in `contacts`, at most one per target per projectile.
    pub fn collect_hits(&self, world: &SimWorld, contacts: &[Contact]) -> Vec<ProjectileHit> {
        let mut hits = Vec::new();
        let mut seen: HashSet<(EntityId, Option<TargetId>)> = HashSet::new();

        for contact in contacts {
            for (mine, other) in [
                (contact.body_a, contact.body_b),
                (contact.body_b, contact.body_a),
            ] {
                let Some(projectile) = self.find_by_body(mine) else {
                    continue;
                };
                let target = match world.entities.kind_of_body(other) {
                    Some(EntityKind::BreakableTarget(id)) => Some(id.clone()),
                    _ => None,
                };
                if seen.insert((projectile, target.clone())) {
                    hits.push(ProjectileHit {
                        projectile,
                        target,
                        point: contact.point,
                    });
                }
            }
        }
        hits
    }

    /// Remove a projectile. Already-removed projectiles are a no-op.
    pub fn remove(&mut self, world: &mut SimWorld, entity: EntityId) -> bool {
        let Some(index) = self.projectiles.iter().position(|p| p.entity == entity) else {
            return false;
        };
        self.projectiles.swap_remove(index);
        if !world.despawn(entity) {
            world.fault(FaultKind::StaleReference, "projectile entity already released");
        }
        true
    }

    /// Remove projectiles older than the configured lifetime.
    pub fn expire(&mut self, world: &mut SimWorld, now: Millis) -> usize {
        let ttl = self.config.ttl_ms;
        let expired: Vec<EntityId> = self
            .projectiles
            .iter()
            .filter(|p| now.saturating_sub(p.spawned_at) >= ttl)
            .map(|p| p.entity)
            .collect();
        expired
            .into_iter()
            .filter(|e| self.remove(world, *e))
            .count()
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    /// Release every projectile and re-arm the cooldown.
    pub fn clear(&mut self, world: &mut SimWorld) {
        for p in self.projectiles.drain(..) {
            world.despawn(p.entity);
        }
        self.cooldown.reset();
    }
}
