//! Physics module
//!
//! Rigid-body stepper for the shared world. Built without an external
//! physics library: spheres, axis-aligned cuboids and a ground plane are
//! enough for characters, projectiles, targets and debris.
//!
//! # Unit System
//!
//! **1 unit = 1 meter** (SI units throughout)
//!
//! - Distances in meters
//! - Velocities in m/s
//! - Accelerations in m/s²
//! - Mass in kg
//!
//! # Submodules
//!
//! - [`types`] - Core mathematical types (Vec3, Quat) re-exported from glam
//! - [`body`] - Rigid bodies, shapes, collision groups and surface materials
//! - [`collision`] - Narrow-phase shape tests
//! - [`world`] - Body storage, fixed-step integration and contact recording

pub mod body;
pub mod collision;
pub mod types;
pub mod world;

// Re-export commonly used types at the physics module level
pub use body::{BodyType, CollisionFilter, CollisionGroups, RigidBody, Shape, SurfaceMaterial};
pub use collision::{ContactPoint, collide};
pub use types::{Quat, Vec3};
pub use world::{
    BodyHandle, Contact, ContactMaterial, DEFAULT_GRAVITY, PhysicsConfig, PhysicsWorld,
};
