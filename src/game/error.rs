//! Session-level errors
//!
//! Only failures that stop a scene from starting are errors. Everything
//! that can go wrong once the session runs is a [`FaultKind`](super::state::FaultKind)
//! handled in place.

use thiserror::Error;

use crate::net::TransportError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to join room: {0}")]
    Transport(#[from] TransportError),
    #[error("scene already started")]
    AlreadyStarted,
}
