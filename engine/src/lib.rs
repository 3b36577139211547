//! peerlab engine
//!
//! Simulation and synchronization core for a server-less peer-to-peer
//! physics playground. Every client runs the same fixed-step simulation and
//! keeps a shared destructible world loosely consistent by broadcasting
//! named actions to the other peers in its room.
//!
//! # Modules
//!
//! - [`physics`] - Rigid bodies, contacts and the fixed-step world
//! - [`player`] - Character controller and animation selection
//! - [`input`] - Platform-agnostic movement input
//! - [`camera`] - Follow camera and movement basis
//! - [`net`] - Room transport, action catalogue and action bus
//! - [`render`] - Scene-graph collaborator trait (+ headless impl)
//! - [`assets`] - Asynchronous model loading collaborator
//! - [`time`] - Clocks, cooldowns and intervals
//! - [`game`] - Entity registry, gameplay systems and the lab scene
//!
//! # Example
//!
//! ```rust,ignore
//! use peerlab_engine::game::{LabConfig, LabScene, SceneRunner};
//! use peerlab_engine::net::LoopbackHub;
//!
//! let hub = LoopbackHub::new();
//! let scene = LabScene::headless(LabConfig::default(), Box::new(hub.clone()), loader, 7);
//! let mut runner = SceneRunner::new(Box::new(scene), Box::new(SystemClock::new()));
//! runner.start()?;
//! loop {
//!     runner.update(frame_delta, &input);
//! }
//! ```

pub mod assets;
pub mod camera;
pub mod input;
pub mod net;
pub mod physics;
pub mod player;
pub mod render;
pub mod time;

// Game-specific modules (located in src/game/ directory)
#[path = "../../src/game/mod.rs"]
pub mod game;

// Re-export commonly used input types
pub use input::{KeyCode, KeyboardState, MovementInput};
// Re-export player types
pub use player::CharacterController;
