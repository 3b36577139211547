//! Game Module
//!
//! The lab scene and the gameplay layer it is built from: configuration,
//! the entity registry, deferred work, the gameplay systems and the scene
//! runner.

pub mod config;
pub mod destruction;
pub mod entities;
pub mod error;
pub mod pending;
pub mod scenes;
pub mod state;
pub mod systems;

pub use config::{FIXED_STEP_S, LabConfig, VisualConfig};
pub use destruction::{DebrisFragment, FragmentShape, plan_debris};
pub use entities::{EntityId, EntityKind, EntityRecord, EntityRegistry};
pub use error::SessionError;
pub use pending::{AssetCompletion, DeferredTask, LoadRequest, PendingQueue};
pub use scenes::{FrameInput, LabScene, SceneRunner, SimulationCore};
pub use state::{FaultKind, SessionStats, SimWorld};
pub use systems::{
    DestructionSystem, PeerPhase, PeerSystem, ProjectileSystem, PropSystem, ReconcileSystem,
    SyncRole,
};
