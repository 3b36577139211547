//! Config Module
//!
//! Centralized configuration for gameplay, networking and presentation.

pub mod lab_config;
pub mod visual_config;

pub use lab_config::{
    ButtonConfig, CharacterConfig, DestructionConfig, FIXED_STEP_S, LabConfig, NetworkConfig,
    PhysicsSettings, ProjectileConfig,
};
pub use visual_config::VisualConfig;
