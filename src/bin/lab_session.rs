//! Lab Session - two peers sharing one playground, headless
//!
//! Run with: `cargo run --bin lab_session`
//!
//! Both peers join the same in-memory room, load their characters and run
//! a scripted few seconds of play: peer 1 seeds the targets, walks and
//! throws, peer 2 wanders around and jumps. The final world state of each
//! peer is logged so the two can be compared.
//!
//! Set `LOG_LEVEL` (e.g. `debug`, `peerlab_engine=trace`) to change verbosity.

use std::rc::Rc;

use peerlab_engine::assets::ImmediateLoader;
use peerlab_engine::game::{
    FIXED_STEP_S, FrameInput, LabConfig, LabScene, SceneRunner, SessionError,
};
use peerlab_engine::input::{KeyCode, KeyboardState, MovementInput};
use peerlab_engine::net::LoopbackHub;
use peerlab_engine::player::{IDLE_CLIP, WALK_CLIP};
use peerlab_engine::time::{Clock, ManualClock, Millis};
use tracing::info;

/// Simulated session length.
const SESSION_SECONDS: u32 = 12;

fn init_telemetry() {
    use tracing_subscriber::{EnvFilter, fmt};
    let filter = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

fn loader(config: &LabConfig) -> Box<ImmediateLoader> {
    Box::new(
        ImmediateLoader::new().with_model(&config.character.model_path, &[WALK_CLIP, IDLE_CLIP]),
    )
}

/// Scripted input for peer 1: walk in bursts, throw twice a second.
fn seeder_input(frame: u32) -> FrameInput {
    let second = frame / 60;
    FrameInput {
        movement: MovementInput {
            forward: if second % 3 == 0 { 1.0 } else { 0.0 },
            right: 0.0,
            jump: false,
        },
        throw: frame % 30 == 0,
        camera_yaw_delta: if second % 3 == 2 { 0.02 } else { 0.0 },
    }
}

/// Scripted key events for peer 2: strafe left and right, hop now and then.
fn joiner_input(frame: u32, keyboard: &mut KeyboardState) -> FrameInput {
    if frame % 60 == 0 {
        let (press, release) = if (frame / 60) % 2 == 0 { ("d", "a") } else { ("a", "d") };
        keyboard.handle_key(KeyCode::from_key_name(release), false);
        keyboard.handle_key(KeyCode::from_key_name(press), true);
    }
    match frame % 90 {
        0 => {
            keyboard.handle_key(KeyCode::Space, true);
        }
        1 => {
            keyboard.handle_key(KeyCode::Space, false);
        }
        _ => {}
    }
    FrameInput {
        movement: MovementInput::sample(keyboard, None),
        ..FrameInput::default()
    }
}

fn log_peer(label: &str, scene: &LabScene) {
    let stats = scene.stats();
    info!(
        peer = label,
        id = %scene.self_id().map(|p| p.to_string()).unwrap_or_default(),
        role = ?scene.role(),
        targets = scene.destruction.target_count(),
        debris = scene.destruction.debris_count(),
        projectiles = scene.projectiles.len(),
        cubes = scene.props.cube_count(),
        remote_ready = scene.peers.ready_count(),
        bodies = scene.world.physics.body_count(),
        broken = stats.targets_broken,
        thrown = stats.projectiles_thrown,
        snapshots = stats.snapshots_applied,
        "peer state"
    );
    for target in scene.destruction.snapshot(&scene.world) {
        info!(peer = label, id = %target.id, position = ?target.position, "target");
    }
}

fn main() -> Result<(), SessionError> {
    init_telemetry();
    info!("=== Lab Session (loopback) ===");

    let config = LabConfig::default();
    let hub = LoopbackHub::new();
    let clock = Rc::new(ManualClock::new(0));

    let seeder = LabScene::headless(config.clone(), Box::new(hub.clone()), loader(&config), 1);
    let joiner = LabScene::headless(config.clone(), Box::new(hub.clone()), loader(&config), 2);
    let mut first = SceneRunner::new(Box::new(seeder), Box::new(clock.clone()));
    let mut second = SceneRunner::new(Box::new(joiner), Box::new(clock.clone()));

    first.start()?;
    second.start()?;

    let mut keyboard = KeyboardState::new();
    let frames = SESSION_SECONDS * 60;
    for frame in 0..frames {
        clock.set((frame as f32 * FIXED_STEP_S * 1000.0) as Millis);
        first.update(FIXED_STEP_S, &seeder_input(frame));
        second.update(FIXED_STEP_S, &joiner_input(frame, &mut keyboard));

        if frame % 120 == 0 {
            let scene = first.core();
            info!(
                t_ms = clock.now_ms(),
                targets = scene.destruction.target_count(),
                remote_ready = scene.peers.ready_count(),
                "tick"
            );
        }
    }

    log_peer("first", first.core());
    log_peer("second", second.core());
    info!(
        delivered = hub.delivered_count(),
        dropped = hub.dropped_count(),
        "transport totals"
    );

    second.stop();
    first.stop();
    Ok(())
}
