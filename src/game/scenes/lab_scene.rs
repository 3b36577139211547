//! LabScene - the shared physics playground.
//!
//! Owns the simulated world, the room connection and every gameplay system.
//! [`step`](SimulationCore::step) is the single entry point for per-frame
//! logic and always runs in the same order:
//!
//! 1. Drain deferred work (timers, room events, asset completions)
//! 2. Resolve projectile hits recorded by the previous step
//! 3. Local input → character controller (and throws)
//! 4. Physics step
//! 5. Grounded detection, button detection
//! 6. Lifetime expiry (projectiles, debris)
//! 7. Physics → visuals, animations, prop growth
//! 8. Outbound `move` / `anim`
//! 9. Reconciliation tick
//!
//! Nothing outside this loop mutates the world: transport and loader
//! callbacks only feed the [`PendingQueue`].

use glam::Vec3;
use rand::Rng;
use tracing::{debug, info, warn};

use super::{FrameInput, SimulationCore};
use crate::assets::{AssetLoader, ModelAsset};
use crate::camera::FollowCamera;
use crate::game::config::{LabConfig, VisualConfig};
use crate::game::entities::{EntityId, EntityKind};
use crate::game::error::SessionError;
use crate::game::pending::{AssetCompletion, DeferredTask, LoadRequest, PendingQueue};
use crate::game::state::{FaultKind, SessionStats, SimWorld};
use crate::game::systems::{
    DestructionSystem, PeerSystem, ProjectileSystem, PropSystem, ReconcileSystem, SyncRole,
};
use crate::net::{
    Action, ActionBus, BusStats, Inbound, MovePayload, PeerId, Transport,
};
use crate::physics::types::horizontal;
use crate::physics::{
    BodyHandle, CollisionGroups, Contact, PhysicsConfig, RigidBody, Shape, SurfaceMaterial,
};
use crate::player::{AnimationMixer, AnimationState, CharacterController};
use crate::render::{HeadlessScene, NodeDesc, NodeKind, SceneGraph};
use crate::time::Millis;

/// Attempts at finding a spawn spot away from the button.
const SPAWN_ATTEMPTS: usize = 20;

#[derive(Debug, Clone, Copy)]
struct LocalCharacter {
    entity: EntityId,
    body: BodyHandle,
}

/// Complete lab scene: world, room connection and gameplay systems.
///
/// Created once from [`LabConfig`] + [`VisualConfig`] and the three host
/// collaborators. Systems and the world are public for hosts that draw
/// HUDs or debug overlays.
pub struct LabScene {
    // -- Config --
    pub config: LabConfig,
    pub visuals: VisualConfig,

    // -- World --
    pub world: SimWorld,

    // -- Systems --
    pub projectiles: ProjectileSystem,
    pub destruction: DestructionSystem,
    pub peers: PeerSystem,
    pub reconcile: ReconcileSystem,
    pub props: PropSystem,

    // -- Local character --
    pub controller: CharacterController,
    pub camera: FollowCamera,
    animation: AnimationState,
    local_mixer: Option<AnimationMixer>,
    local: Option<LocalCharacter>,
    local_request: Option<LoadRequest>,
    last_velocity: Vec3,

    // -- Collaborators --
    transport: Box<dyn Transport>,
    loader: Box<dyn AssetLoader>,
    bus: Option<ActionBus>,
    self_id: Option<PeerId>,
    queue: PendingQueue,

    /// Contacts of the last physics step, resolved at the start of the next frame
    step_contacts: Vec<Contact>,
    running: bool,
}

impl LabScene {
    pub fn new(
        config: LabConfig,
        visuals: VisualConfig,
        transport: Box<dyn Transport>,
        loader: Box<dyn AssetLoader>,
        scene: Box<dyn SceneGraph>,
        seed: u64,
    ) -> Self {
        let physics = PhysicsConfig {
            gravity: config.physics.gravity,
            ..PhysicsConfig::default()
        };
        let world = SimWorld::new(physics, scene, seed);

        Self {
            projectiles: ProjectileSystem::new(
                config.projectile.clone(),
                visuals.projectile_color,
            ),
            destruction: DestructionSystem::new(
                config.destruction.clone(),
                visuals.target_color,
                visuals.debris_color,
            ),
            peers: PeerSystem::new(config.character.clone(), visuals.clone()),
            reconcile: ReconcileSystem::new(&config.network),
            props: PropSystem::new(config.button.clone(), visuals.clone()),

            controller: CharacterController::with_speeds(
                config.character.walk_speed,
                config.character.jump_velocity,
            ),
            camera: FollowCamera::new(),
            animation: AnimationState::new(),
            local_mixer: None,
            local: None,
            local_request: None,
            last_velocity: Vec3::ZERO,

            transport,
            loader,
            bus: None,
            self_id: None,
            queue: PendingQueue::new(),

            step_contacts: Vec::new(),
            running: false,

            world,
            config,
            visuals,
        }
    }

    /// Scene backed by an in-memory scene graph.
    pub fn headless(
        config: LabConfig,
        transport: Box<dyn Transport>,
        loader: Box<dyn AssetLoader>,
        seed: u64,
    ) -> Self {
        Self::new(
            config,
            VisualConfig::default(),
            transport,
            loader,
            Box::new(HeadlessScene::new()),
            seed,
        )
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Our id in the room, once joined.
    pub fn self_id(&self) -> Option<&PeerId> {
        self.self_id.as_ref()
    }

    pub fn stats(&self) -> SessionStats {
        self.world.stats
    }

    pub fn bus_stats(&self) -> Option<BusStats> {
        self.bus.as_ref().map(ActionBus::stats)
    }

    pub fn role(&self) -> Option<SyncRole> {
        self.reconcile.role()
    }

    pub fn local_entity(&self) -> Option<EntityId> {
        self.local.map(|l| l.entity)
    }

    pub fn local_position(&self) -> Option<Vec3> {
        let local = self.local?;
        self.world.physics.get(local.body).map(|b| b.position)
    }

    pub fn local_velocity(&self) -> Option<Vec3> {
        let local = self.local?;
        self.world.physics.get(local.body).map(|b| b.linear_velocity)
    }

    /// Teleport the local character and stop it.
    pub fn place_local_character(&mut self, position: Vec3) -> bool {
        let Some(local) = self.local else {
            return false;
        };
        self.world.physics.set_translation(local.body, position)
            && self.world.physics.set_linear_velocity(local.body, Vec3::ZERO)
    }

    // ============================================
    // Setup
    // ============================================

    fn spawn_ground(&mut self) {
        let body = RigidBody::fixed(Shape::Plane)
            .with_filter(CollisionGroups::GROUND, CollisionGroups::ALL)
            .with_material(SurfaceMaterial::Ground);
        let node = NodeDesc::new(NodeKind::Plane {
            size: self.config.ground_size,
        })
        .colored(self.visuals.ground_color);
        self.world.spawn(EntityKind::Ground, body, Some(node));
    }

    fn request_local_model(&mut self) {
        let (request, callback) = self.queue.asset_callback();
        self.local_request = Some(request);
        self.loader.load(&self.config.character.model_path, callback);
    }

    /// Spawn spot for the local character, kept clear of the button.
    fn local_spawn_point(&mut self) -> Vec3 {
        let extent = self.config.character.local_spawn_extent;
        let button = self.config.button.position;
        let clearance = self.config.button.cube_keep_out + self.config.button.radius;
        let rng = &mut self.world.rng;

        let mut point = Vec3::ZERO;
        for _ in 0..SPAWN_ATTEMPTS {
            point = Vec3::new(
                rng.random::<f32>() * extent * 2.0 - extent,
                self.config.character.spawn_height,
                rng.random::<f32>() * extent * 2.0 - extent,
            );
            let clear = (point.x - button.x).abs() >= clearance
                || (point.z - button.z).abs() >= clearance;
            if clear {
                break;
            }
        }
        point
    }

    fn spawn_local_character(&mut self, asset: ModelAsset) {
        let position = self.local_spawn_point();
        let cfg = &self.config.character;
        let body = RigidBody::dynamic(Shape::Sphere { radius: cfg.radius }, cfg.mass)
            .with_position(position)
            .with_damping(cfg.linear_damping, cfg.angular_damping)
            .with_filter(
                CollisionGroups::CHARACTER,
                CollisionGroups::GROUND
                    | CollisionGroups::BREAKABLE
                    | CollisionGroups::PROJECTILE
                    | CollisionGroups::CHARACTER,
            )
            .with_material(SurfaceMaterial::Character);
        let node = NodeDesc::new(NodeKind::Model {
            asset: asset.path.clone(),
        })
        .at(position + self.visuals.character_offset);

        let (entity, body) = self.world.spawn(EntityKind::LocalCharacter, body, Some(node));
        if let Some(record) = self.world.entities.get_mut(entity) {
            record.visual_offset = self.visuals.character_offset;
        }
        self.local_mixer = AnimationMixer::new(asset.clips).map(|mut mixer| {
            mixer.time_scale = self.visuals.animation_time_scale;
            mixer
        });
        self.local = Some(LocalCharacter { entity, body });
        self.camera.follow(position);
        info!(?position, "local character ready");
    }

    // ============================================
    // Outbound
    // ============================================

    fn broadcast(&mut self, action: &Action) {
        let Some(bus) = self.bus.as_mut() else {
            return;
        };
        if !bus.send(action) {
            self.world
                .fault(FaultKind::TransportDeliveryLoss, action.channel().as_str());
        }
    }

    fn send_full_sync(&mut self) {
        let snapshot = self.destruction.snapshot(&self.world);
        debug!(targets = snapshot.len(), "sending full-sync");
        self.broadcast(&Action::FullSync(snapshot));
        self.reconcile.note_sent();
    }

    fn other_peer_count(&self) -> usize {
        self.bus.as_ref().map_or(0, ActionBus::peer_count)
    }

    // ============================================
    // Inbound
    // ============================================

    fn drain_pending(&mut self, now: Millis) {
        for task in self.queue.take_due(now) {
            match task {
                DeferredTask::SendFullSync => {
                    if ReconcileSystem::may_send_deferred(self.destruction.has_world_state()) {
                        self.send_full_sync();
                    }
                }
                DeferredTask::ReleaseButton => self.props.release(&mut self.world),
            }
        }

        for event in self.queue.drain_room() {
            let Some(bus) = self.bus.as_mut() else {
                break;
            };
            match bus.interpret(event) {
                Ok(Some(inbound)) => self.handle_inbound(inbound, now),
                Ok(None) => {}
                Err(err) => {
                    self.world
                        .fault(FaultKind::MalformedMessage, &err.to_string());
                }
            }
        }

        for completion in self.queue.drain_assets() {
            self.handle_asset(completion);
        }
    }

    fn handle_asset(&mut self, completion: AssetCompletion) {
        if self.local_request != Some(completion.request) {
            self.peers.on_asset_loaded(&mut self.world, completion);
            return;
        }
        self.local_request = None;
        match completion.result {
            Ok(asset) => self.spawn_local_character(asset),
            Err(err) => {
                warn!(%err, "local character model failed to load");
                self.world
                    .fault(FaultKind::AssetLoadFailure, "local character model");
            }
        }
    }

    fn handle_inbound(&mut self, inbound: Inbound, now: Millis) {
        let Some(self_id) = self.self_id.clone() else {
            return;
        };
        match inbound {
            Inbound::PeerJoined(peer) => {
                self.peers.on_join(
                    &mut self.world,
                    &peer,
                    &self_id,
                    self.loader.as_mut(),
                    &mut self.queue,
                );
                self.reconcile.on_peer_joined(now, &mut self.queue);
            }
            Inbound::PeerLeft(peer) => {
                self.peers.on_leave(&mut self.world, &peer);
            }
            Inbound::Action { from, action } => self.apply_action(&from, action, &self_id, now),
        }
    }

    fn apply_action(&mut self, from: &PeerId, action: Action, self_id: &PeerId, now: Millis) {
        match action {
            Action::Move(payload) => self.peers.on_move(
                &mut self.world,
                from,
                &payload,
                self_id,
                self.loader.as_mut(),
                &mut self.queue,
            ),
            Action::Anim(clip) => self.peers.on_anim(
                &mut self.world,
                from,
                clip,
                self_id,
                self.loader.as_mut(),
                &mut self.queue,
            ),
            Action::SpawnTarget(target) => {
                self.destruction.spawn_target(&mut self.world, &target);
            }
            Action::BreakTarget(payload) => {
                self.destruction
                    .break_target(&mut self.world, &payload.id, payload.impact_point);
            }
            Action::ThrowProjectile(throw) => {
                self.projectiles.spawn(&mut self.world, &throw);
            }
            Action::PressButton => {
                self.props.press(&mut self.world, now, &mut self.queue);
            }
            Action::SpawnCube(spot) => {
                self.props.add_cube(&mut self.world, spot);
            }
            Action::FullSync(targets) => {
                self.destruction.apply_snapshot(&mut self.world, &targets);
            }
        }
    }

    // ============================================
    // Frame phases
    // ============================================

    fn resolve_hits(&mut self) {
        let contacts = std::mem::take(&mut self.step_contacts);
        let hits = self.projectiles.collect_hits(&self.world, &contacts);
        for hit in hits {
            if let Some(target) = &hit.target
                && let Some(payload) =
                    self.destruction
                        .break_target(&mut self.world, target, hit.point)
            {
                self.broadcast(&Action::BreakTarget(payload));
            }
            self.projectiles.remove(&mut self.world, hit.projectile);
        }
    }

    fn drive_character(&mut self, input: &FrameInput, now: Millis) {
        self.camera.rotate(input.camera_yaw_delta);
        let Some(local) = self.local else {
            return;
        };
        let basis = self.camera.basis();
        let Some(body) = self.world.physics.get_mut(local.body) else {
            self.world
                .fault(FaultKind::StaleReference, "local character body");
            return;
        };
        let outcome = self.controller.update(&input.movement, &basis, body);
        let origin = body.position;
        self.last_velocity = outcome.velocity;
        self.world
            .entities
            .set_facing(local.entity, self.controller.facing_yaw());

        if input.throw {
            let facing = self.controller.facing_direction();
            if let Some(throw) = self
                .projectiles
                .try_throw(&mut self.world, origin, facing, now)
            {
                self.broadcast(&Action::ThrowProjectile(throw));
            }
        }
    }

    fn check_button(&mut self, now: Millis) {
        let Some(position) = self.local_position() else {
            return;
        };
        if !self.props.detect_press(position) {
            return;
        }
        self.props.press(&mut self.world, now, &mut self.queue);
        self.broadcast(&Action::PressButton);

        let spot = self.props.choose_cube_spot(&mut self.world.rng);
        self.broadcast(&Action::SpawnCube(spot));
        self.props.add_cube(&mut self.world, spot);
    }

    fn animate_local(&mut self) {
        let Some(local) = self.local else {
            return;
        };
        let speed = horizontal(self.last_velocity).length();
        let Some(clip) = self.animation.select(speed) else {
            return;
        };
        let playing = self.local_mixer.as_mut().is_some_and(|m| m.play(clip));
        if playing
            && let Some(visual) = self.world.entities.get(local.entity).and_then(|r| r.visual)
        {
            self.world.scene.play_animation(visual, clip);
        }
    }

    fn send_local_state(&mut self, now: Millis) {
        let Some(position) = self.local_position() else {
            return;
        };
        let payload = MovePayload::new(position, self.controller.facing_yaw());
        if let Some(bus) = self.bus.as_mut() {
            bus.send_move(payload, now);
        }
        if let Some(clip) = self.animation.take_broadcast() {
            self.broadcast(&Action::Anim(clip));
        }
    }
}

impl SimulationCore for LabScene {
    fn init(&mut self, now: Millis) -> Result<(), SessionError> {
        if self.running {
            return Err(SessionError::AlreadyStarted);
        }
        self.world.now = now;
        self.world.physics.set_contact_material(
            SurfaceMaterial::Ground,
            SurfaceMaterial::Character,
            self.config.physics.ground_character,
        );
        self.spawn_ground();
        self.props.spawn_button(&mut self.world);

        let room = self
            .transport
            .join(&self.config.network.room_id, self.queue.room_sender())?;
        let bus = ActionBus::new(room, self.config.network.move_interval_ms);
        let others = bus.peer_count();
        self.self_id = Some(bus.self_id().clone());
        info!(
            room = bus.room_id(),
            peer = %bus.self_id(),
            others,
            "joined room"
        );
        self.bus = Some(bus);

        if self.reconcile.start(others, now, &mut self.queue) == SyncRole::Seeder {
            let seeded = self.destruction.seed_targets(&mut self.world);
            for target in seeded {
                self.broadcast(&Action::SpawnTarget(target));
            }
        }

        self.request_local_model();
        self.running = true;
        Ok(())
    }

    fn step(&mut self, dt: f32, input: &FrameInput, now: Millis) {
        if !self.running {
            return;
        }
        self.world.now = now;

        // 1. Deferred work
        self.drain_pending(now);

        // 2. Hits from the previous step
        self.resolve_hits();

        // 3. Input
        self.drive_character(input, now);

        // 4. Physics
        self.world.physics.step(dt);
        self.step_contacts = self.world.physics.contacts().to_vec();

        // 5. Contacts of this step that matter immediately
        if let Some(local) = self.local {
            self.controller.detect_ground(&self.step_contacts, local.body);
        }
        self.check_button(now);

        // 6. Lifetimes
        self.projectiles.expire(&mut self.world, now);
        self.destruction.expire_debris(&mut self.world, now);

        // 7. Presentation
        self.world.sync_visuals();
        if let Some(position) = self.local_position() {
            self.camera.follow(position);
        }
        self.animate_local();
        self.peers.sync_animations(&mut self.world);
        self.props.animate(&mut self.world);

        // 8. Outbound state
        self.send_local_state(now);

        // 9. Reconciliation
        if self
            .reconcile
            .tick(now, self.destruction.has_world_state(), self.other_peer_count())
        {
            self.send_full_sync();
        }
    }

    fn teardown(&mut self) {
        if let Some(mut bus) = self.bus.take() {
            bus.leave();
        }
        self.queue.clear();
        self.local_request = None;

        self.projectiles.clear(&mut self.world);
        self.destruction.clear(&mut self.world);
        self.peers.clear(&mut self.world);
        self.props.clear(&mut self.world);
        let released = self.world.despawn_all();
        self.world.physics.clear();

        self.local = None;
        self.local_mixer = None;
        self.animation = AnimationState::new();
        self.controller.reset();
        self.reconcile.reset();
        self.step_contacts.clear();
        self.last_velocity = Vec3::ZERO;
        self.self_id = None;
        if self.running {
            info!(released, "scene torn down");
        }
        self.running = false;
    }
}

impl Drop for LabScene {
    fn drop(&mut self) {
        self.teardown();
    }
}
