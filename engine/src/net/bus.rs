//! Network action bus
//!
//! Thin layer between gameplay and a [`Room`]: encodes outbound actions,
//! throttles `move`, and turns raw [`RoomEvent`]s into decoded
//! [`Inbound`] items with self-originated traffic filtered out.

use tracing::{debug, trace, warn};

use super::actions::{Action, ActionError, MovePayload};
use super::transport::{PeerId, Room, RoomEvent};
use crate::time::{Cooldown, Millis};

/// Minimum spacing between `move` broadcasts (ms).
pub const DEFAULT_MOVE_INTERVAL_MS: Millis = 40;

/// A room event worth acting on.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    PeerJoined(PeerId),
    PeerLeft(PeerId),
    Action { from: PeerId, action: Action },
}

/// Counters for outbound/inbound traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    pub sent: usize,
    pub send_failures: usize,
    pub throttled: usize,
    pub received: usize,
    pub ignored_self: usize,
}

/// Outbound/inbound action plumbing for one joined room.
pub struct ActionBus {
    room: Box<dyn Room>,
    move_throttle: Cooldown,
    stats: BusStats,
}

impl ActionBus {
    pub fn new(room: Box<dyn Room>, move_interval_ms: Millis) -> Self {
        Self {
            room,
            move_throttle: Cooldown::new(move_interval_ms),
            stats: BusStats::default(),
        }
    }

    pub fn self_id(&self) -> &PeerId {
        self.room.self_id()
    }

    pub fn room_id(&self) -> &str {
        self.room.id()
    }

    pub fn peers(&self) -> Vec<PeerId> {
        self.room.peers()
    }

    pub fn peer_count(&self) -> usize {
        self.room.peers().len()
    }

    pub fn stats(&self) -> BusStats {
        self.stats
    }

    /// Broadcast an action. Failures are logged and dropped.
    ///
    /// Returns `true` if the transport accepted the message.
    pub fn send(&mut self, action: &Action) -> bool {
        let channel = action.channel().as_str();
        let payload = match action.encode() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%err, "dropping unencodable action");
                self.stats.send_failures += 1;
                return false;
            }
        };
        match self.room.broadcast(channel, &payload) {
            Ok(()) => {
                trace!(channel, bytes = payload.len(), "action sent");
                self.stats.sent += 1;
                true
            }
            Err(err) => {
                warn!(channel, %err, "transport rejected action");
                self.stats.send_failures += 1;
                false
            }
        }
    }

    /// Broadcast the local character state, at most once per move interval.
    pub fn send_move(&mut self, payload: MovePayload, now: Millis) -> bool {
        if !self.move_throttle.try_fire(now) {
            self.stats.throttled += 1;
            return false;
        }
        self.send(&Action::Move(payload))
    }

    /// Decode a raw room event.
    ///
    /// Self-originated events yield `Ok(None)`; unknown channels and
    /// undecodable payloads yield an error for the caller to log.
    pub fn interpret(&mut self, event: RoomEvent) -> Result<Option<Inbound>, ActionError> {
        let self_id = self.room.self_id();
        match event {
            RoomEvent::PeerJoined(peer) | RoomEvent::PeerLeft(peer) if &peer == self_id => {
                self.stats.ignored_self += 1;
                Ok(None)
            }
            RoomEvent::PeerJoined(peer) => Ok(Some(Inbound::PeerJoined(peer))),
            RoomEvent::PeerLeft(peer) => Ok(Some(Inbound::PeerLeft(peer))),
            RoomEvent::Message { from, .. } if &from == self_id => {
                self.stats.ignored_self += 1;
                trace!("ignoring self-originated message");
                Ok(None)
            }
            RoomEvent::Message {
                channel,
                from,
                payload,
            } => {
                self.stats.received += 1;
                let action = Action::decode(&channel, &payload)?;
                Ok(Some(Inbound::Action { from, action }))
            }
        }
    }

    /// Leave the room. Safe to call more than once.
    pub fn leave(&mut self) {
        debug!(room = self.room.id(), "leaving room");
        self.room.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::loopback::LoopbackHub;
    use crate::net::transport::Transport;
    use glam::Vec3;
    use std::sync::mpsc::{Receiver, channel};

    fn pair() -> (ActionBus, Receiver<RoomEvent>, ActionBus, Receiver<RoomEvent>, LoopbackHub) {
        let mut hub = LoopbackHub::new();
        let (tx_a, rx_a) = channel();
        let (tx_b, rx_b) = channel();
        let a = ActionBus::new(hub.join("lab", tx_a).expect("join"), DEFAULT_MOVE_INTERVAL_MS);
        let b = ActionBus::new(hub.join("lab", tx_b).expect("join"), DEFAULT_MOVE_INTERVAL_MS);
        (a, rx_a, b, rx_b, hub)
    }

    #[test]
    fn test_move_throttled_to_one_per_window() {
        let (mut a, _rx_a, _b, rx_b, _hub) = pair();
        let _ = rx_b.try_recv(); // join notice

        let mut accepted = 0;
        for i in 0..1000u64 {
            // 1000 attempts spread over 39 ms
            let now = 10_000 + i * 39 / 1000;
            if a.send_move(MovePayload::new(Vec3::ZERO, 0.0), now) {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(rx_b.try_iter().count(), 1);
        assert_eq!(a.stats().throttled, 999);
    }

    #[test]
    fn test_self_echo_ignored() {
        let (mut a, rx_a, _b, _rx_b, hub) = pair();
        hub.set_echo(true);
        let _ = rx_a.try_recv(); // join notice

        assert!(a.send(&Action::PressButton));
        let echoed = rx_a.try_recv().expect("echo delivered");
        assert_eq!(a.interpret(echoed).expect("valid"), None);
        assert_eq!(a.stats().ignored_self, 1);
    }

    #[test]
    fn test_remote_action_decoded() {
        let (mut a, _rx_a, mut b, rx_b, _hub) = pair();
        let _ = rx_b.try_recv();
        a.send(&Action::Anim("animation.goblin.walk".into()));

        let event = rx_b.try_recv().expect("delivered");
        let inbound = b.interpret(event).expect("valid").expect("not self");
        assert_eq!(
            inbound,
            Inbound::Action {
                from: a.self_id().clone(),
                action: Action::Anim("animation.goblin.walk".into()),
            }
        );
    }

    #[test]
    fn test_malformed_message_is_an_error() {
        let (_a, _rx_a, mut b, _rx_b, _hub) = pair();
        let event = RoomEvent::Message {
            channel: "move".into(),
            from: PeerId::new("stranger"),
            payload: b"not json".to_vec(),
        };
        assert!(b.interpret(event).is_err());
    }
}
