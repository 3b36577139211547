//! Transport abstraction
//!
//! The engine never talks to signaling servers or data channels directly.
//! A [`Transport`] joins a named room and pushes every room event (peer
//! joined, peer left, named message) into an `mpsc` channel owned by the
//! frame loop; the returned [`Room`] handle broadcasts named payloads and
//! lists the currently connected peers.

use std::fmt;
use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;
use thiserror::Error;

/// Opaque peer identifier assigned by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Something that happened in a joined room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    PeerJoined(PeerId),
    PeerLeft(PeerId),
    Message {
        channel: String,
        from: PeerId,
        payload: Vec<u8>,
    },
}

// Events are produced on transport threads and drained by the frame loop.
assert_impl_all!(RoomEvent: Send);
assert_impl_all!(PeerId: Send, Sync);

/// Transport-level failures. Callers log these and move on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("not joined to room {room}")]
    NotJoined { room: String },
    #[error("room {room} is closed")]
    RoomClosed { room: String },
    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
}

/// Handle to a joined room.
pub trait Room {
    fn id(&self) -> &str;

    /// Our own identity in the room.
    fn self_id(&self) -> &PeerId;

    /// Currently connected remote peers (never includes ourselves).
    fn peers(&self) -> Vec<PeerId>;

    /// Fire-and-forget delivery of `payload` on `channel` to every peer.
    fn broadcast(&mut self, channel: &str, payload: &[u8]) -> Result<(), TransportError>;

    /// Leave the room and stop delivering events. Idempotent.
    fn leave(&mut self);
}

/// Peer-to-peer room provider.
pub trait Transport {
    /// Join `room_id`; room events are pushed into `events` until the
    /// returned room is left.
    fn join(
        &mut self,
        room_id: &str,
        events: Sender<RoomEvent>,
    ) -> Result<Box<dyn Room>, TransportError>;
}
