//! Simulation state shared by every system
//!
//! [`SimWorld`] bundles the physics world, the entity registry, the host
//! scene graph, the session RNG and fault counters so systems can take one
//! `&mut SimWorld` instead of five parameters.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use super::entities::{EntityId, EntityKind, EntityRegistry};
use crate::physics::{BodyHandle, PhysicsConfig, PhysicsWorld, RigidBody};
use crate::render::{NodeDesc, SceneGraph};
use crate::time::Millis;

/// Recoverable synchronization faults. All are handled locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// A broadcast was rejected or never arrived
    TransportDeliveryLoss,
    /// An event referenced an entity that no longer exists
    StaleReference,
    /// The same logical event was applied twice
    DuplicateEvent,
    /// A model failed to load
    AssetLoadFailure,
    /// A message could not be decoded
    MalformedMessage,
}

/// Per-session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub transport_delivery_loss: usize,
    pub stale_references: usize,
    pub duplicate_events: usize,
    pub asset_failures: usize,
    pub malformed_messages: usize,
    pub targets_broken: usize,
    pub projectiles_thrown: usize,
    pub snapshots_applied: usize,
}

impl SessionStats {
    pub fn record(&mut self, fault: FaultKind) {
        match fault {
            FaultKind::TransportDeliveryLoss => self.transport_delivery_loss += 1,
            FaultKind::StaleReference => self.stale_references += 1,
            FaultKind::DuplicateEvent => self.duplicate_events += 1,
            FaultKind::AssetLoadFailure => self.asset_failures += 1,
            FaultKind::MalformedMessage => self.malformed_messages += 1,
        }
    }

    pub fn faults(&self, fault: FaultKind) -> usize {
        match fault {
            FaultKind::TransportDeliveryLoss => self.transport_delivery_loss,
            FaultKind::StaleReference => self.stale_references,
            FaultKind::DuplicateEvent => self.duplicate_events,
            FaultKind::AssetLoadFailure => self.asset_failures,
            FaultKind::MalformedMessage => self.malformed_messages,
        }
    }
}

/// Physics, entities, scene graph and RNG for one running scene.
pub struct SimWorld {
    pub physics: PhysicsWorld,
    pub entities: EntityRegistry,
    pub scene: Box<dyn SceneGraph>,
    pub rng: StdRng,
    pub stats: SessionStats,
    /// Timestamp of the frame being simulated
    pub now: Millis,
}

impl SimWorld {
    pub fn new(physics: PhysicsConfig, scene: Box<dyn SceneGraph>, seed: u64) -> Self {
        Self {
            physics: PhysicsWorld::new(physics),
            entities: EntityRegistry::new(),
            scene,
            rng: StdRng::seed_from_u64(seed),
            stats: SessionStats::default(),
            now: 0,
        }
    }

    /// Create body, optional visual node and entity in one go.
    pub fn spawn(
        &mut self,
        kind: EntityKind,
        body: RigidBody,
        node: Option<NodeDesc>,
    ) -> (EntityId, BodyHandle) {
        let handle = self.physics.add_body(body);
        let visual = node.map(|desc| self.scene.add_node(desc));
        let id = self.entities.spawn(kind, handle, visual, self.now);
        (id, handle)
    }

    /// Release an entity with its body and visual. `false` if already gone.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        self.entities
            .despawn(id, &mut self.physics, self.scene.as_mut())
            .is_some()
    }

    pub fn despawn_all(&mut self) -> usize {
        self.entities
            .despawn_all(&mut self.physics, self.scene.as_mut())
    }

    /// Copy physics transforms onto visuals.
    pub fn sync_visuals(&mut self) -> usize {
        self.entities.sync_visuals(&self.physics, self.scene.as_mut())
    }

    /// Count and log a handled fault.
    pub fn fault(&mut self, fault: FaultKind, detail: &str) {
        self.stats.record(fault);
        debug!(?fault, detail, "sync fault handled");
    }
}
