//! Game systems - self-contained modules that own state and logic.

pub mod destruction_system;
pub mod peer_system;
pub mod projectile_system;
pub mod prop_system;
pub mod reconcile_system;

pub use destruction_system::{DestructionSystem, TARGET_ID_LEN, generate_target_id};
pub use peer_system::{PeerPhase, PeerSystem, random_display_name};
pub use projectile_system::{ProjectileHit, ProjectileSystem};
pub use prop_system::{CUBE_SIZE, PropSystem};
pub use reconcile_system::{ReconcileSystem, SyncRole};
