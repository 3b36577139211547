//! Networking
//!
//! Room transport abstraction, an in-memory implementation, the catalogue
//! of named actions and the bus that throttles and filters them.
//!
//! # Submodules
//!
//! - [`transport`] - `Transport`/`Room` traits, `PeerId`, `RoomEvent`
//! - [`loopback`] - In-process hub for tests and local sessions
//! - [`actions`] - Channel names and JSON payloads
//! - [`bus`] - Encoding, `move` throttling and self-origin filtering

pub mod actions;
pub mod bus;
pub mod loopback;
pub mod transport;

pub use actions::{
    Action, ActionChannel, ActionError, BreakTargetPayload, CubePayload, MovePayload, TargetId,
    TargetSnapshot, ThrowPayload,
};
pub use bus::{ActionBus, BusStats, DEFAULT_MOVE_INTERVAL_MS, Inbound};
pub use loopback::{LoopbackHub, LoopbackRoom};
pub use transport::{PeerId, Room, RoomEvent, Transport, TransportError};
