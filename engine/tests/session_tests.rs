//! Session Tests - Two or More Lab Scenes on One Loopback Room
//!
//! Every scene here is headless and driven with explicit timestamps, so the
//! scenarios are deterministic: seeding, joining, throwing, breaking,
//! button presses and teardown, observed from each peer's own world.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{Receiver, channel};

use glam::Vec3;
use peerlab_engine::assets::{AssetLoader, ImmediateLoader, ManualLoader};
use peerlab_engine::game::{
    EntityKind, FIXED_STEP_S, FrameInput, LabConfig, LabScene, SimulationCore, SyncRole,
};
use peerlab_engine::net::{
    Action, ActionBus, BreakTargetPayload, DEFAULT_MOVE_INTERVAL_MS, LoopbackHub, MovePayload,
    Room, RoomEvent, TargetId, TargetSnapshot, ThrowPayload, Transport,
};
use peerlab_engine::render::SceneGraph;
use peerlab_engine::time::Millis;
use peerlab_engine::MovementInput;

const FRAME_MS: Millis = 16;
const ROOM: &str = "main-room";
const MODEL: &str = "models/testlab/goblin.glb";

// ============================================================================
// Harness
// ============================================================================

fn config(seed_count: usize) -> LabConfig {
    let mut config = LabConfig::default();
    config.destruction.seed_count = seed_count;
    config
}

fn immediate() -> Box<dyn AssetLoader> {
    Box::new(ImmediateLoader::new().with_model(MODEL, &["Idle", "Walk"]))
}

fn scene(hub: &LoopbackHub, seed_count: usize, loader: Box<dyn AssetLoader>, seed: u64) -> LabScene {
    LabScene::headless(config(seed_count), Box::new(hub.clone()), loader, seed)
}

/// Step every scene once per frame, in order, starting after `from`.
fn run(scenes: &mut [&mut LabScene], from: Millis, frames: u64) -> Millis {
    let mut now = from;
    for _ in 0..frames {
        now += FRAME_MS;
        for scene in scenes.iter_mut() {
            scene.step(FIXED_STEP_S, &FrameInput::default(), now);
        }
    }
    now
}

/// A bare room member that speaks the wire format directly.
fn raw_peer(hub: &LoopbackHub) -> (Box<dyn Room>, Receiver<RoomEvent>) {
    let (tx, rx) = channel();
    let room = hub.clone().join(ROOM, tx).expect("loopback join");
    (room, rx)
}

fn send_raw(room: &mut Box<dyn Room>, action: &Action) {
    let bytes = action.encode().expect("encodable action");
    room.broadcast(action.channel().as_str(), &bytes)
        .expect("loopback broadcast");
}

fn count_kind(scene: &LabScene, pred: impl Fn(&EntityKind) -> bool) -> usize {
    scene.world.entities.count_where(pred)
}

/// Both scenes hold the same target ids at (nearly) the same positions.
fn assert_same_targets(a: &LabScene, b: &LabScene) {
    let seeder: HashMap<_, _> = a
        .destruction
        .snapshot(&a.world)
        .into_iter()
        .map(|t| (t.id, t.position))
        .collect();
    let joiner: HashMap<_, _> = b
        .destruction
        .snapshot(&b.world)
        .into_iter()
        .map(|t| (t.id, t.position))
        .collect();

    assert_eq!(seeder.len(), 5);
    assert_eq!(
        seeder.keys().collect::<HashSet<_>>(),
        joiner.keys().collect::<HashSet<_>>()
    );
    for (id, position) in &seeder {
        let other = joiner[id];
        assert!(
            position.distance(other) < 0.1,
            "target {id} at {position:?} on one peer but {other:?} on the other"
        );
    }
}

// ============================================================================
// Seeding and reconciliation
// ============================================================================

#[test]
fn test_first_peer_seeds_distinct_targets() {
    let hub = LoopbackHub::new();
    let mut a = scene(&hub, 5, Box::new(ManualLoader::new()), 1);
    a.init(0).expect("init");

    assert_eq!(a.role(), Some(SyncRole::Seeder));
    assert_eq!(a.destruction.target_count(), 5);
    let mut ids: Vec<_> = a.destruction.target_ids().cloned().collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 5, "target ids are unique");
    assert_eq!(
        count_kind(&a, |k| matches!(k, EntityKind::BreakableTarget(_))),
        5
    );
}

#[test]
fn test_joiner_converges_to_seeder_targets() {
    let hub = LoopbackHub::new();
    let mut a = scene(&hub, 5, Box::new(ManualLoader::new()), 11);
    let mut b = scene(&hub, 5, Box::new(ManualLoader::new()), 12);
    a.init(0).expect("init a");
    b.init(0).expect("init b");

    assert_eq!(b.role(), Some(SyncRole::Joiner));
    assert_eq!(b.destruction.target_count(), 0, "joiners never seed");

    // Initial snapshot goes out one second after seeding
    run(&mut [&mut a, &mut b], 0, 70);

    assert_same_targets(&a, &b);
    assert!(b.stats().snapshots_applied >= 1);
}

#[test]
fn test_periodic_snapshot_heals_dropped_messages() {
    let hub = LoopbackHub::new();
    hub.set_channel_blocked("spawn-target", true);
    hub.set_channel_blocked("full-sync", true);

    let mut a = scene(&hub, 5, Box::new(ManualLoader::new()), 21);
    let mut b = scene(&hub, 5, Box::new(ManualLoader::new()), 22);
    a.init(0).expect("init a");
    b.init(0).expect("init b");

    // The post-join snapshot is lost with everything else
    let now = run(&mut [&mut a, &mut b], 0, 100);
    assert_eq!(a.destruction.target_count(), 5);
    assert_eq!(b.destruction.target_count(), 0);
    assert!(hub.dropped_count() >= 1);

    // Only the 5000 ms periodic snapshot can repair the joiner now
    hub.set_channel_blocked("full-sync", false);
    let now = run(&mut [&mut a, &mut b], now, (4900 - now) / FRAME_MS);
    assert!(now < 5000);
    assert_eq!(b.destruction.target_count(), 0, "no snapshot before the period");

    run(&mut [&mut a, &mut b], now, (5300 - now) / FRAME_MS);
    assert_same_targets(&a, &b);
    assert!(b.stats().snapshots_applied >= 1);
}

#[test]
fn test_broken_target_is_not_resurrected_by_stale_snapshot() {
    let hub = LoopbackHub::new();
    let mut a = scene(&hub, 5, Box::new(ManualLoader::new()), 3);
    a.init(0).expect("init");

    let stale = a.destruction.snapshot(&a.world);
    let victim = stale[0].id.clone();
    assert!(
        a.destruction
            .break_target(&mut a.world, &victim, stale[0].position)
            .is_some()
    );

    let (mut raw, _events) = raw_peer(&hub);
    send_raw(&mut raw, &Action::FullSync(stale));
    run(&mut [&mut a], 0, 1);

    assert_eq!(a.destruction.target_count(), 4);
    assert!(!a.destruction.is_live(&victim));
    assert!(a.destruction.is_tombstoned(&victim));
}

// ============================================================================
// Projectiles and destruction
// ============================================================================

#[test]
fn test_projectile_breaks_target_on_next_frame() {
    let hub = LoopbackHub::new();
    let mut a = scene(&hub, 0, Box::new(ManualLoader::new()), 4);
    a.init(0).expect("init");

    let id = TargetId::new("target001");
    let target = TargetSnapshot {
        id: id.clone(),
        position: Vec3::new(0.0, 1.0, -2.0),
    };
    assert!(a.destruction.spawn_target(&mut a.world, &target));
    a.projectiles.spawn(
        &mut a.world,
        &ThrowPayload {
            position: Vec3::new(0.0, 1.0, 0.0),
            direction: Vec3::NEG_Z,
            velocity: 50.0,
        },
    );

    // Contact happens during the first step and is resolved on the second
    let now = run(&mut [&mut a], 0, 1);
    assert!(a.destruction.is_live(&id));
    run(&mut [&mut a], now, 1);

    assert!(!a.destruction.is_live(&id));
    assert_eq!(a.destruction.debris_count(), 20);
    assert_eq!(count_kind(&a, |k| *k == EntityKind::Debris), 20);
    assert!(a.projectiles.is_empty(), "projectile is consumed by the hit");
    assert_eq!(a.stats().targets_broken, 1);
}

#[test]
fn test_duplicate_break_over_the_wire_is_applied_once() {
    let hub = LoopbackHub::new();
    let mut a = scene(&hub, 5, Box::new(ManualLoader::new()), 5);
    a.init(0).expect("init");
    let victim = a.destruction.snapshot(&a.world)[0].clone();

    let (mut raw, _events) = raw_peer(&hub);
    let payload = BreakTargetPayload {
        id: victim.id.clone(),
        position: victim.position,
        broken: true,
        impact_point: victim.position + Vec3::Z,
    };
    send_raw(&mut raw, &Action::BreakTarget(payload.clone()));
    send_raw(&mut raw, &Action::BreakTarget(payload));
    run(&mut [&mut a], 0, 1);

    assert_eq!(a.destruction.target_count(), 4);
    assert_eq!(a.destruction.debris_count(), 20);
    assert_eq!(a.stats().duplicate_events, 1);
}

#[test]
fn test_throw_respects_cooldown() {
    let hub = LoopbackHub::new();
    let mut a = scene(&hub, 0, immediate(), 6);
    a.init(0).expect("init");
    let throw = FrameInput {
        throw: true,
        ..FrameInput::default()
    };

    a.step(FIXED_STEP_S, &FrameInput::default(), 16);
    assert!(a.local_entity().is_some(), "character loads on the first frame");

    a.step(FIXED_STEP_S, &throw, 32);
    a.step(FIXED_STEP_S, &throw, 82);
    assert_eq!(a.stats().projectiles_thrown, 1, "second throw inside 200ms");

    a.step(FIXED_STEP_S, &throw, 232);
    assert_eq!(a.stats().projectiles_thrown, 2);
}

#[test]
fn test_projectile_expires_after_ttl() {
    let hub = LoopbackHub::new();
    let mut a = scene(&hub, 0, Box::new(ManualLoader::new()), 7);
    a.init(0).expect("init");
    let now = run(&mut [&mut a], 0, 1);

    a.projectiles.spawn(
        &mut a.world,
        &ThrowPayload {
            position: Vec3::new(0.0, 1000.0, 0.0),
            direction: Vec3::Y,
            velocity: 0.0,
        },
    );
    a.step(FIXED_STEP_S, &FrameInput::default(), now + 4999);
    assert_eq!(a.projectiles.len(), 1);
    a.step(FIXED_STEP_S, &FrameInput::default(), now + 5000);
    assert!(a.projectiles.is_empty());
    assert_eq!(count_kind(&a, |k| *k == EntityKind::Projectile), 0);
}

#[test]
fn test_self_echo_is_ignored() {
    let hub = LoopbackHub::new();
    hub.set_echo(true);
    let mut a = scene(&hub, 0, immediate(), 8);
    a.init(0).expect("init");
    let now = run(&mut [&mut a], 0, 3);

    let throw = FrameInput {
        throw: true,
        ..FrameInput::default()
    };
    a.step(FIXED_STEP_S, &throw, now + FRAME_MS);
    assert_eq!(a.projectiles.len(), 1);
    run(&mut [&mut a], now + FRAME_MS, 1);

    assert_eq!(a.projectiles.len(), 1, "echoed throw must not spawn a copy");
    assert_eq!(a.peers.ready_count() + a.peers.loading_count(), 0);
    assert!(a.bus_stats().is_some_and(|s| s.ignored_self >= 2));
}

// ============================================================================
// Characters
// ============================================================================

#[test]
fn test_character_grounds_then_jumps_once() {
    let hub = LoopbackHub::new();
    let mut a = scene(&hub, 0, immediate(), 9);
    a.init(0).expect("init");
    let now = run(&mut [&mut a], 0, 90);

    assert!(a.controller.is_grounded(), "character settled on the ground");
    let y = a.local_position().expect("local character").y;
    assert!((y - 0.5).abs() < 0.05, "resting height {y}");

    let jump = FrameInput {
        movement: MovementInput {
            jump: true,
            ..MovementInput::default()
        },
        ..FrameInput::default()
    };
    a.step(FIXED_STEP_S, &jump, now + FRAME_MS);
    let vy = a.local_velocity().expect("local character").y;
    assert!(vy > 7.0, "jump sets vertical velocity, got {vy}");
    assert!(a.controller.is_airborne());

    a.step(FIXED_STEP_S, &jump, now + 2 * FRAME_MS);
    let vy2 = a.local_velocity().expect("local character").y;
    assert!(vy2 < vy, "no second jump while airborne");
}

#[test]
fn test_remote_character_created_once_per_peer() {
    let hub = LoopbackHub::new();
    let mut a = scene(&hub, 0, immediate(), 10);
    let mut b = scene(&hub, 0, immediate(), 20);
    a.init(0).expect("init a");
    b.init(0).expect("init b");

    // Moves keep arriving after the join; none of them may add a second body
    run(&mut [&mut a, &mut b], 0, 60);

    let remote = |s: &LabScene| count_kind(s, |k| matches!(k, EntityKind::RemoteCharacter(_)));
    assert_eq!(remote(&a), 1);
    assert_eq!(remote(&b), 1);

    let peer_b = b.self_id().cloned().expect("b joined");
    let entity = a.peers.entity_of(&peer_b).expect("b is ready on a");
    let record = a.world.entities.get(entity).expect("record");
    let on_a = a.world.physics.get(record.body).expect("body").position;
    let on_b = b.local_position().expect("b's character");
    assert!(
        on_a.distance(on_b) < 0.5,
        "remote copy follows broadcast moves: {on_a:?} vs {on_b:?}"
    );
}

#[test]
fn test_peer_leaving_before_model_loads_leaves_nothing() {
    let hub = LoopbackHub::new();
    let loader_a = ManualLoader::new().with_model(MODEL, &["Idle", "Walk"]);
    let mut a = scene(&hub, 0, Box::new(loader_a.clone()), 13);
    let mut b = scene(&hub, 0, Box::new(ManualLoader::new()), 14);
    a.init(0).expect("init a");
    b.init(0).expect("init b");
    let peer_b = b.self_id().cloned().expect("b joined");

    let now = run(&mut [&mut a], 0, 1);
    assert!(a.peers.is_loading(&peer_b));

    b.teardown();
    let now = run(&mut [&mut a], now, 1);
    assert!(a.peers.phase(&peer_b).is_none());

    // Our own model plus the abandoned remote one
    assert_eq!(loader_a.complete_all(), 2);
    run(&mut [&mut a], now, 1);

    assert!(a.local_entity().is_some());
    assert_eq!(
        count_kind(&a, |k| matches!(k, EntityKind::RemoteCharacter(_))),
        0
    );
}

// ============================================================================
// Button and cubes
// ============================================================================

#[test]
fn test_button_press_spawns_cube_on_every_peer() {
    let hub = LoopbackHub::new();
    let mut a = scene(&hub, 0, immediate(), 15);
    let mut b = scene(&hub, 0, immediate(), 16);
    a.init(0).expect("init a");
    b.init(0).expect("init b");
    let now = run(&mut [&mut a, &mut b], 0, 5);

    assert!(a.place_local_character(Vec3::new(5.0, 0.85, 0.0)));
    run(&mut [&mut a, &mut b], now, 2);

    assert!(a.props.is_pressed());
    assert!(b.props.is_pressed());
    assert_eq!(a.props.cube_count(), 1);
    assert_eq!(b.props.cube_count(), 1);

    let on_a = a.props.cube_positions().next().expect("cube on a");
    let on_b = b.props.cube_positions().next().expect("cube on b");
    assert!((on_a.x - on_b.x).abs() < 1e-4 && (on_a.z - on_b.z).abs() < 1e-4);
    assert!((on_a.y - 0.5).abs() < 1e-4, "first cube rests on the ground");
}

// ============================================================================
// Bus and teardown
// ============================================================================

#[test]
fn test_move_broadcasts_are_throttled() {
    let mut hub = LoopbackHub::new();
    let (tx_a, _rx_a) = channel();
    let (tx_b, rx_b) = channel();
    let room_a = hub.join(ROOM, tx_a).expect("join a");
    let _room_b = hub.join(ROOM, tx_b).expect("join b");
    let mut bus = ActionBus::new(room_a, DEFAULT_MOVE_INTERVAL_MS);

    let payload = MovePayload::new(Vec3::new(1.0, 0.5, 2.0), 0.3);
    let accepted = (0..1000).filter(|_| bus.send_move(payload, 10)).count();
    assert_eq!(accepted, 1);
    assert!(bus.send_move(payload, 10 + DEFAULT_MOVE_INTERVAL_MS));

    let moves = rx_b
        .try_iter()
        .filter(|e| matches!(e, RoomEvent::Message { channel, .. } if channel == "move"))
        .count();
    assert_eq!(moves, 2);
    assert_eq!(bus.stats().throttled, 999);
}

#[test]
fn test_teardown_releases_everything() {
    let hub = LoopbackHub::new();
    let mut a = scene(&hub, 5, immediate(), 17);
    let mut b = scene(&hub, 5, immediate(), 18);
    a.init(0).expect("init a");
    b.init(0).expect("init b");
    let now = run(&mut [&mut a, &mut b], 0, 30);
    assert_eq!(b.peers.ready_count(), 1);

    a.teardown();
    assert!(!a.is_running());
    assert_eq!(a.world.physics.body_count(), 0);
    assert_eq!(a.world.scene.node_count(), 0);
    assert!(a.world.entities.is_empty());
    assert_eq!(hub.member_count(ROOM), 1);

    run(&mut [&mut b], now, 1);
    assert_eq!(b.peers.ready_count(), 0, "b drops a's character");

    // Second teardown and stepping a stopped scene are both no-ops
    a.teardown();
    a.step(FIXED_STEP_S, &FrameInput::default(), now + FRAME_MS);
    assert_eq!(a.world.physics.body_count(), 0);
}
