//! Peer session management.
//!
//! Tracks every remote peer through `Loading → Ready` and owns the remote
//! character entities. The transport and asset loader only ever reach this
//! system through the scene's deferred queue, so a `leave` that races an
//! asset load is resolved here by discarding the late completion.

use std::collections::HashMap;

use glam::Vec3;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::assets::AssetLoader;
use crate::game::config::{CharacterConfig, VisualConfig};
use crate::game::entities::{EntityId, EntityKind};
use crate::game::pending::{AssetCompletion, LoadRequest, PendingQueue};
use crate::game::state::{FaultKind, SimWorld};
use crate::net::{MovePayload, PeerId};
use crate::physics::{CollisionGroups, RigidBody, Shape, SurfaceMaterial};
use crate::player::AnimationMixer;
use crate::render::{NodeDesc, NodeKind};

/// Adjectives for generated display names.
const NAME_ADJECTIVES: [&str; 15] = [
    "Travesso",
    "Astuto",
    "Fedorento",
    "Saltitante",
    "Ranzinza",
    "Veloz",
    "Barulhento",
    "Zangado",
    "Misterioso",
    "Sorrateiro",
    "Bagunceiro",
    "Engraçado",
    "Fanfarrão",
    "Desastrado",
    "Esperto",
];

/// Random "Goblin <Adjective>" name.
pub fn random_display_name(rng: &mut impl Rng) -> String {
    let adjective = NAME_ADJECTIVES[rng.random_range(0..NAME_ADJECTIVES.len())];
    format!("Goblin {adjective}")
}

/// Lifecycle of a known peer. Unknown and gone peers have no entry.
#[derive(Debug)]
pub enum PeerPhase {
    /// Model requested, no entity yet
    Loading { request: LoadRequest },
    /// Character entity live
    Ready {
        entity: EntityId,
        mixer: Option<AnimationMixer>,
    },
}

#[derive(Debug)]
struct PeerEntry {
    phase: PeerPhase,
    /// Last clip the peer announced
    anim: Option<String>,
}

/// Owns remote peers and their characters.
pub struct PeerSystem {
    config: CharacterConfig,
    visual: VisualConfig,
    peers: HashMap<PeerId, PeerEntry>,
    pending: HashMap<LoadRequest, PeerId>,
    names: HashMap<PeerId, String>,
}

impl PeerSystem {
    pub fn new(config: CharacterConfig, visual: VisualConfig) -> Self {
        Self {
            config,
            visual,
            peers: HashMap::new(),
            pending: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// A peer entered the room. Starts loading its character model.
    ///
    /// Returns `false` for self and for peers that are already known.
    pub fn on_join(
        &mut self,
        world: &mut SimWorld,
        peer: &PeerId,
        self_id: &PeerId,
        loader: &mut dyn AssetLoader,
        queue: &mut PendingQueue,
    ) -> bool {
        if peer == self_id {
            return false;
        }
        if self.peers.contains_key(peer) {
            world.fault(FaultKind::DuplicateEvent, "join for a known peer");
            return false;
        }

        let (request, callback) = queue.asset_callback();
        self.peers.insert(peer.clone(), PeerEntry {
            phase: PeerPhase::Loading { request },
            anim: None,
        });
        self.pending.insert(request, peer.clone());
        info!(%peer, "peer joined, loading character");
        loader.load(&self.config.model_path, callback);
        true
    }

    /// Handle a finished model load.
    ///
    /// Returns `false` when the completion is not ours (unknown request) or
    /// arrived after the peer left.
    pub fn on_asset_loaded(&mut self, world: &mut SimWorld, completion: AssetCompletion) -> bool {
        let Some(peer) = self.pending.remove(&completion.request) else {
            return false;
        };
        let still_loading = matches!(
            self.peers.get(&peer),
            Some(PeerEntry { phase: PeerPhase::Loading { request }, .. }) if *request == completion.request
        );
        if !still_loading {
            debug!(%peer, "discarding model load for a departed peer");
            return false;
        }

        let asset = match completion.result {
            Ok(asset) => asset,
            Err(err) => {
                warn!(%peer, %err, "character model failed to load");
                self.peers.remove(&peer);
                world.fault(FaultKind::AssetLoadFailure, "remote character model");
                return false;
            }
        };

        let name = self
            .names
            .entry(peer.clone())
            .or_insert_with(|| random_display_name(&mut world.rng))
            .clone();

        let extent = self.config.remote_spawn_extent;
        let position = Vec3::new(
            world.rng.random::<f32>() * extent * 2.0 - extent,
            self.config.spawn_height,
            world.rng.random::<f32>() * extent * 2.0 - extent,
        );
        let body = RigidBody::kinematic(Shape::Sphere {
            radius: self.config.radius,
        })
        .with_position(position)
        .with_filter(
            CollisionGroups::CHARACTER,
            CollisionGroups::GROUND | CollisionGroups::PROJECTILE | CollisionGroups::CHARACTER,
        )
        .with_material(SurfaceMaterial::Character);
        let node = NodeDesc::new(NodeKind::Model {
            asset: asset.path.clone(),
        })
        .at(position + self.visual.character_offset)
        .labeled(name.clone());

        let (entity, _) = world.spawn(EntityKind::RemoteCharacter(peer.clone()), body, Some(node));
        if let Some(record) = world.entities.get_mut(entity) {
            record.visual_offset = self.visual.character_offset;
        }
        let mixer = AnimationMixer::new(asset.clips).map(|mut mixer| {
            mixer.time_scale = self.visual.animation_time_scale;
            mixer
        });

        if let Some(entry) = self.peers.get_mut(&peer) {
            entry.phase = PeerPhase::Ready { entity, mixer };
        }
        info!(%peer, %name, "remote character ready");
        true
    }

    /// A peer left. Releases everything it owned, whatever its phase.
    pub fn on_leave(&mut self, world: &mut SimWorld, peer: &PeerId) -> bool {
        self.names.remove(peer);
        let Some(entry) = self.peers.remove(peer) else {
            world.fault(FaultKind::StaleReference, "leave for an unknown peer");
            return false;
        };
        match entry.phase {
            PeerPhase::Loading { request } => {
                self.pending.remove(&request);
            }
            PeerPhase::Ready { entity, .. } => {
                world.despawn(entity);
            }
        }
        info!(%peer, "peer left");
        true
    }

    /// Place a remote character from a `move` message.
    ///
    /// Unknown peers are joined implicitly; moves for loading peers are
    /// dropped (the next one will land once the model is ready).
    pub fn on_move(
        &mut self,
        world: &mut SimWorld,
        peer: &PeerId,
        payload: &MovePayload,
        self_id: &PeerId,
        loader: &mut dyn AssetLoader,
        queue: &mut PendingQueue,
    ) {
        match self.peers.get(peer).map(|e| &e.phase) {
            None => {
                debug!(%peer, "move from unseen peer, joining implicitly");
                self.on_join(world, peer, self_id, loader, queue);
            }
            Some(PeerPhase::Loading { .. }) => {}
            Some(PeerPhase::Ready { entity, .. }) => {
                let entity = *entity;
                let Some(body) = world.entities.get(entity).map(|r| r.body) else {
                    world.fault(FaultKind::StaleReference, "remote character without entity");
                    return;
                };
                world.physics.set_translation(body, payload.position());
                world.entities.set_facing(entity, payload.rot_y);
            }
        }
    }

    /// Remember the clip a peer is playing.
    ///
    /// Like `move`, an `anim` from an unseen peer joins it implicitly; the
    /// clip starts once its character is ready.
    pub fn on_anim(
        &mut self,
        world: &mut SimWorld,
        peer: &PeerId,
        clip: String,
        self_id: &PeerId,
        loader: &mut dyn AssetLoader,
        queue: &mut PendingQueue,
    ) {
        if !self.peers.contains_key(peer) {
            debug!(%peer, "anim from unseen peer, joining implicitly");
            self.on_join(world, peer, self_id, loader, queue);
        }
        if let Some(entry) = self.peers.get_mut(peer) {
            entry.anim = Some(clip);
        }
    }

    /// Start announced clips on ready characters. Returns clips switched.
    pub fn sync_animations(&mut self, world: &mut SimWorld) -> usize {
        let mut switched = 0;
        for entry in self.peers.values_mut() {
            let (PeerPhase::Ready { entity, mixer: Some(mixer) }, Some(clip)) =
                (&mut entry.phase, entry.anim.as_deref())
            else {
                continue;
            };
            if !mixer.play(clip) {
                continue;
            }
            if let Some(visual) = world.entities.get(*entity).and_then(|r| r.visual) {
                world.scene.play_animation(visual, clip);
            }
            switched += 1;
        }
        switched
    }

    pub fn phase(&self, peer: &PeerId) -> Option<&PeerPhase> {
        self.peers.get(peer).map(|e| &e.phase)
    }

    pub fn is_ready(&self, peer: &PeerId) -> bool {
        matches!(self.phase(peer), Some(PeerPhase::Ready { .. }))
    }

    pub fn is_loading(&self, peer: &PeerId) -> bool {
        matches!(self.phase(peer), Some(PeerPhase::Loading { .. }))
    }

    pub fn entity_of(&self, peer: &PeerId) -> Option<EntityId> {
        match self.phase(peer) {
            Some(PeerPhase::Ready { entity, .. }) => Some(*entity),
            _ => None,
        }
    }

    pub fn display_name(&self, peer: &PeerId) -> Option<&str> {
        self.names.get(peer).map(String::as_str)
    }

    /// Clip currently playing on a ready peer's mixer.
    pub fn playing_clip(&self, peer: &PeerId) -> Option<&str> {
        match self.phase(peer) {
            Some(PeerPhase::Ready { mixer: Some(mixer), .. }) => mixer.playing(),
            _ => None,
        }
    }

    pub fn ready_count(&self) -> usize {
        self.peers
            .values()
            .filter(|e| matches!(e.phase, PeerPhase::Ready { .. }))
            .count()
    }

    pub fn loading_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop every peer and release their characters.
    pub fn clear(&mut self, world: &mut SimWorld) {
        for (_, entry) in self.peers.drain() {
            if let PeerPhase::Ready { entity, .. } = entry.phase {
                world.despawn(entity);
            }
        }
        self.pending.clear();
        self.names.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ManualLoader;
    use crate::game::config::LabConfig;
    use crate::physics::PhysicsConfig;
    use crate::player::{IDLE_CLIP, WALK_CLIP};
    use crate::render::HeadlessScene;

    struct Fixture {
        world: SimWorld,
        peers: PeerSystem,
        loader: ManualLoader,
        queue: PendingQueue,
        me: PeerId,
    }

    impl Fixture {
        fn new() -> Self {
            let config = LabConfig::default().character;
            let loader = ManualLoader::new().with_model(&config.model_path, &[WALK_CLIP, IDLE_CLIP]);
            Self {
                world: SimWorld::new(PhysicsConfig::default(), Box::new(HeadlessScene::new()), 4),
                peers: PeerSystem::new(config, VisualConfig::default()),
                loader,
                queue: PendingQueue::new(),
                me: PeerId::new("me"),
            }
        }

        fn join(&mut self, peer: &PeerId) -> bool {
            self.peers
                .on_join(&mut self.world, peer, &self.me, &mut self.loader, &mut self.queue)
        }

        fn anim(&mut self, peer: &PeerId, clip: &str) {
            self.peers.on_anim(
                &mut self.world,
                peer,
                clip.to_string(),
                &self.me,
                &mut self.loader,
                &mut self.queue,
            );
        }

        fn finish_loads(&mut self) {
            self.loader.complete_all();
            for completion in self.queue.drain_assets() {
                self.peers.on_asset_loaded(&mut self.world, completion);
            }
        }
    }

    #[test]
    fn test_duplicate_join_creates_one_character() {
        let mut fx = Fixture::new();
        let peer = PeerId::new("p1");
        assert!(fx.join(&peer));
        assert!(!fx.join(&peer));
        fx.finish_loads();
        assert!(!fx.join(&peer), "ready peers are not re-joined");
        assert_eq!(fx.world.physics.body_count(), 1);
        assert_eq!(fx.world.scene.node_count(), 1);
        assert!(fx.peers.is_ready(&peer));
    }

    #[test]
    fn test_self_join_ignored() {
        let mut fx = Fixture::new();
        let me = fx.me.clone();
        assert!(!fx.join(&me));
        assert_eq!(fx.peers.loading_count(), 0);
    }

    #[test]
    fn test_leave_before_ready_leaves_nothing() {
        let mut fx = Fixture::new();
        let peer = PeerId::new("p2");
        fx.join(&peer);
        assert!(fx.peers.on_leave(&mut fx.world, &peer));
        fx.finish_loads();
        assert_eq!(fx.world.physics.body_count(), 0);
        assert_eq!(fx.world.scene.node_count(), 0);
        assert!(fx.peers.phase(&peer).is_none());
        assert_eq!(fx.peers.loading_count(), 0);
    }

    #[test]
    fn test_failed_load_drops_peer() {
        let mut fx = Fixture::new();
        let peer = PeerId::new("p3");
        fx.join(&peer);
        fx.loader.fail_all("corrupt");
        for completion in fx.queue.drain_assets() {
            fx.peers.on_asset_loaded(&mut fx.world, completion);
        }
        assert!(fx.peers.phase(&peer).is_none());
        assert_eq!(fx.world.stats.asset_failures, 1);
    }

    #[test]
    fn test_move_places_ready_character() {
        let mut fx = Fixture::new();
        let peer = PeerId::new("p4");
        fx.join(&peer);
        fx.finish_loads();

        let payload = MovePayload::new(Vec3::new(3.0, 1.0, -2.0), 0.7);
        fx.peers.on_move(
            &mut fx.world,
            &peer,
            &payload,
            &PeerId::new("me"),
            &mut fx.loader,
            &mut fx.queue,
        );
        let entity = fx.peers.entity_of(&peer).expect("ready");
        let record = fx.world.entities.get(entity).expect("record");
        let body = fx.world.physics.get(record.body).expect("body");
        assert_eq!(body.position, Vec3::new(3.0, 1.0, -2.0));
        assert_eq!(record.facing_yaw, Some(0.7));
    }

    #[test]
    fn test_move_from_unknown_peer_joins() {
        let mut fx = Fixture::new();
        let peer = PeerId::new("ghost");
        let payload = MovePayload::new(Vec3::ZERO, 0.0);
        fx.peers.on_move(
            &mut fx.world,
            &peer,
            &payload,
            &PeerId::new("me"),
            &mut fx.loader,
            &mut fx.queue,
        );
        assert!(fx.peers.is_loading(&peer));
    }

    #[test]
    fn test_anim_received_while_loading_applies_when_ready() {
        let mut fx = Fixture::new();
        let peer = PeerId::new("p5");
        fx.join(&peer);
        fx.anim(&peer, WALK_CLIP);
        assert_eq!(fx.peers.sync_animations(&mut fx.world), 0);

        fx.finish_loads();
        assert_eq!(fx.peers.sync_animations(&mut fx.world), 1);
        assert_eq!(fx.peers.sync_animations(&mut fx.world), 0);
        assert_eq!(fx.peers.playing_clip(&peer), Some(WALK_CLIP));
    }

    #[test]
    fn test_display_name_memo_dropped_on_leave() {
        let mut fx = Fixture::new();
        let peer = PeerId::new("p6");
        fx.join(&peer);
        fx.finish_loads();
        let name = fx.peers.display_name(&peer).expect("named").to_string();
        assert!(name.starts_with("Goblin "));
        fx.peers.on_leave(&mut fx.world, &peer);
        assert!(fx.peers.display_name(&peer).is_none());
    }

    #[test]
    fn test_anim_from_unknown_peer_joins_and_plays_when_ready() {
        let mut fx = Fixture::new();
        let peer = PeerId::new("early");
        fx.anim(&peer, WALK_CLIP);
        assert!(fx.peers.is_loading(&peer), "anim alone is enough to join");
        assert_eq!(fx.world.stats.stale_references, 0);

        fx.finish_loads();
        assert!(fx.peers.is_ready(&peer));
        assert_eq!(fx.peers.sync_animations(&mut fx.world), 1);
        assert_eq!(fx.peers.playing_clip(&peer), Some(WALK_CLIP));

        let me = fx.me.clone();
        fx.anim(&me, WALK_CLIP);
        assert!(fx.peers.phase(&me).is_none(), "own echo never joins");
    }
}
