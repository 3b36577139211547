//! Network action catalogue
//!
//! Named channels and their JSON payloads. Every action is fire-and-forget:
//! nothing is acknowledged, retried or ordered across channels.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, globally unique breakable-target identifier (shared by all peers).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Channel names on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionChannel {
    Move,
    Anim,
    SpawnTarget,
    BreakTarget,
    ThrowProjectile,
    PressButton,
    SpawnCube,
    FullSync,
}

impl ActionChannel {
    pub const ALL: [ActionChannel; 8] = [
        ActionChannel::Move,
        ActionChannel::Anim,
        ActionChannel::SpawnTarget,
        ActionChannel::BreakTarget,
        ActionChannel::ThrowProjectile,
        ActionChannel::PressButton,
        ActionChannel::SpawnCube,
        ActionChannel::FullSync,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionChannel::Move => "move",
            ActionChannel::Anim => "anim",
            ActionChannel::SpawnTarget => "spawn-target",
            ActionChannel::BreakTarget => "break-target",
            ActionChannel::ThrowProjectile => "throw-projectile",
            ActionChannel::PressButton => "press-button",
            ActionChannel::SpawnCube => "spawn-cube",
            ActionChannel::FullSync => "full-sync",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

/// Character body position plus facing yaw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovePayload {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rot_y: f32,
}

impl MovePayload {
    pub fn new(position: Vec3, rot_y: f32) -> Self {
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
            rot_y,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// One unbroken target as seen by the sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSnapshot {
    pub id: TargetId,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrowPayload {
    pub position: Vec3,
    pub direction: Vec3,
    pub velocity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakTargetPayload {
    pub id: TargetId,
    pub position: Vec3,
    pub broken: bool,
    pub impact_point: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubePayload {
    pub x: f32,
    pub z: f32,
}

/// Decoded network action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Move(MovePayload),
    Anim(String),
    SpawnTarget(TargetSnapshot),
    BreakTarget(BreakTargetPayload),
    ThrowProjectile(ThrowPayload),
    PressButton,
    SpawnCube(CubePayload),
    FullSync(Vec<TargetSnapshot>),
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("unknown channel {0:?}")]
    UnknownChannel(String),
    #[error("malformed {channel} payload: {source}")]
    Malformed {
        channel: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {channel} payload: {source}")]
    Encode {
        channel: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl Action {
    pub fn channel(&self) -> ActionChannel {
        match self {
            Action::Move(_) => ActionChannel::Move,
            Action::Anim(_) => ActionChannel::Anim,
            Action::SpawnTarget(_) => ActionChannel::SpawnTarget,
            Action::BreakTarget(_) => ActionChannel::BreakTarget,
            Action::ThrowProjectile(_) => ActionChannel::ThrowProjectile,
            Action::PressButton => ActionChannel::PressButton,
            Action::SpawnCube(_) => ActionChannel::SpawnCube,
            Action::FullSync(_) => ActionChannel::FullSync,
        }
    }

    /// Serialize the payload for [`channel`](Action::channel).
    pub fn encode(&self) -> Result<Vec<u8>, ActionError> {
        let channel = self.channel().as_str();
        let bytes = match self {
            Action::Move(p) => serde_json::to_vec(p),
            Action::Anim(name) => serde_json::to_vec(name),
            Action::SpawnTarget(p) => serde_json::to_vec(p),
            Action::BreakTarget(p) => serde_json::to_vec(p),
            Action::ThrowProjectile(p) => serde_json::to_vec(p),
            Action::PressButton => serde_json::to_vec(&()),
            Action::SpawnCube(p) => serde_json::to_vec(p),
            Action::FullSync(list) => serde_json::to_vec(list),
        };
        bytes.map_err(|source| ActionError::Encode { channel, source })
    }

    /// Parse a payload received on the channel named `channel`.
    pub fn decode(channel: &str, payload: &[u8]) -> Result<Self, ActionError> {
        let kind = ActionChannel::from_name(channel)
            .ok_or_else(|| ActionError::UnknownChannel(channel.to_string()))?;
        let name = kind.as_str();
        let malformed = |source| ActionError::Malformed {
            channel: name,
            source,
        };
        let action = match kind {
            ActionChannel::Move => Action::Move(serde_json::from_slice(payload).map_err(malformed)?),
            ActionChannel::Anim => Action::Anim(serde_json::from_slice(payload).map_err(malformed)?),
            ActionChannel::SpawnTarget => {
                Action::SpawnTarget(serde_json::from_slice(payload).map_err(malformed)?)
            }
            ActionChannel::BreakTarget => {
                Action::BreakTarget(serde_json::from_slice(payload).map_err(malformed)?)
            }
            ActionChannel::ThrowProjectile => {
                Action::ThrowProjectile(serde_json::from_slice(payload).map_err(malformed)?)
            }
            ActionChannel::PressButton => Action::PressButton,
            ActionChannel::SpawnCube => {
                Action::SpawnCube(serde_json::from_slice(payload).map_err(malformed)?)
            }
            ActionChannel::FullSync => {
                Action::FullSync(serde_json::from_slice(payload).map_err(malformed)?)
            }
        };
        Ok(action)
    }
}
