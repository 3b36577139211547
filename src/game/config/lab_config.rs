//! Lab Configuration
//!
//! Centralized gameplay, physics and networking tunables for the lab scene.
//! `Default` returns the values every peer in a room is expected to share;
//! peers with different configs still interoperate but will disagree on
//! local effects (debris, cooldowns).

use glam::Vec3;

use crate::physics::{ContactMaterial, DEFAULT_GRAVITY};
use crate::time::Millis;

/// Fixed simulation step (seconds).
pub const FIXED_STEP_S: f32 = 1.0 / 60.0;

/// Stepper and contact-material settings.
#[derive(Clone, Debug)]
pub struct PhysicsSettings {
    pub gravity: Vec3,
    pub fixed_step_s: f32,
    /// Ground × character surface pair
    pub ground_character: ContactMaterial,
}

/// Local and remote character bodies.
#[derive(Clone, Debug)]
pub struct CharacterConfig {
    pub walk_speed: f32,
    pub jump_velocity: f32,
    pub radius: f32,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Height at which characters appear
    pub spawn_height: f32,
    /// Half extent of the square the local character spawns in
    pub local_spawn_extent: f32,
    /// Half extent of the square remote characters appear in
    pub remote_spawn_extent: f32,
    /// Model path requested for every character
    pub model_path: String,
}

/// Thrown projectiles.
#[derive(Clone, Debug)]
pub struct ProjectileConfig {
    pub speed: f32,
    pub radius: f32,
    pub mass: f32,
    pub damping: f32,
    pub cooldown_ms: Millis,
    pub ttl_ms: Millis,
    /// Added to the launch velocity so throws arc
    pub upward_bias: f32,
    /// Distance ahead of the thrower's centre
    pub spawn_forward: f32,
    /// Height above the thrower's centre
    pub spawn_up: f32,
}

/// Breakable targets and their debris.
#[derive(Clone, Debug)]
pub struct DestructionConfig {
    pub target_size: f32,
    pub target_mass: f32,
    pub target_damping: f32,
    pub target_health: f32,
    /// Targets created by the seeding peer
    pub seed_count: usize,
    /// Half extent of the seeding square
    pub seed_extent: f32,
    pub seed_height: f32,
    /// Seeded targets closer than this are nudged apart
    pub min_target_spacing: f32,
    pub debris_count: usize,
    pub debris_mass: f32,
    pub debris_damping: f32,
    pub debris_ttl_ms: Millis,
    /// Radial impulse away from the impact point
    pub explosion_force: f32,
    /// Minimum upward impulse (plus up to `upward_jitter`)
    pub upward_impulse: f32,
    pub upward_jitter: f32,
    /// Angular velocity range per axis (±half)
    pub spin: f32,
}

/// Room and reconciliation timing.
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    pub app_id: String,
    pub room_id: String,
    pub move_interval_ms: Millis,
    pub sync_interval_ms: Millis,
    /// Delay before the first snapshot after seeding or a peer join
    pub initial_sync_delay_ms: Millis,
}

/// Pressure button and the cubes it spawns.
#[derive(Clone, Debug)]
pub struct ButtonConfig {
    pub position: Vec3,
    pub radius: f32,
    pub height: f32,
    /// Vertical tolerance around `position.y + 0.5`
    pub trigger_height: f32,
    pub release_ms: Millis,
    /// Frames the button stays disarmed after releasing
    pub rearm_frames: u32,
    pub cube_ring_min: f32,
    pub cube_ring_max: f32,
    pub cube_placement_attempts: usize,
    /// Minimum distance from existing props
    pub cube_clearance: f32,
    /// Minimum distance from the button and from the origin
    pub cube_keep_out: f32,
    /// Props closer than this (per axis) count as the same stack
    pub stack_tolerance: f32,
}

/// Central configuration for the lab scene.
#[derive(Clone, Debug)]
pub struct LabConfig {
    pub physics: PhysicsSettings,
    pub character: CharacterConfig,
    pub projectile: ProjectileConfig,
    pub destruction: DestructionConfig,
    pub network: NetworkConfig,
    pub button: ButtonConfig,
    /// Edge length of the visible ground plane
    pub ground_size: f32,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsSettings {
                gravity: DEFAULT_GRAVITY,
                fixed_step_s: FIXED_STEP_S,
                ground_character: ContactMaterial {
                    friction: 0.8,
                    restitution: 0.0,
                },
            },
            character: CharacterConfig {
                walk_speed: 5.0,
                jump_velocity: 8.0,
                radius: 0.5,
                mass: 1.0,
                linear_damping: 0.3,
                angular_damping: 0.5,
                spawn_height: 2.0,
                local_spawn_extent: 4.0,
                remote_spawn_extent: 2.0,
                model_path: "models/testlab/goblin.glb".to_string(),
            },
            projectile: ProjectileConfig {
                speed: 50.0,
                radius: 0.3,
                mass: 5.0,
                damping: 0.1,
                cooldown_ms: 200,
                ttl_ms: 5000,
                upward_bias: 2.0,
                spawn_forward: 1.0,
                spawn_up: 0.5,
            },
            destruction: DestructionConfig {
                target_size: 2.0,
                target_mass: 5.0,
                target_damping: 0.4,
                target_health: 100.0,
                seed_count: 5,
                seed_extent: 10.0,
                seed_height: 1.0,
                min_target_spacing: 3.0,
                debris_count: 20,
                debris_mass: 0.1,
                debris_damping: 0.1,
                debris_ttl_ms: 5000,
                explosion_force: 25.0,
                upward_impulse: 10.0,
                upward_jitter: 10.0,
                spin: 20.0,
            },
            network: NetworkConfig {
                app_id: "trystero-3d-lab".to_string(),
                room_id: "main-room".to_string(),
                move_interval_ms: 40,
                sync_interval_ms: 5000,
                initial_sync_delay_ms: 1000,
            },
            button: ButtonConfig {
                position: Vec3::new(5.0, 0.15, 0.0),
                radius: 0.7,
                height: 0.3,
                trigger_height: 0.7,
                release_ms: 200,
                rearm_frames: 30,
                cube_ring_min: 4.0,
                cube_ring_max: 6.0,
                cube_placement_attempts: 20,
                cube_clearance: 0.9,
                cube_keep_out: 1.5,
                stack_tolerance: 0.6,
            },
            ground_size: 100.0,
        }
    }
}
