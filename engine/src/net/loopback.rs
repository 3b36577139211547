//! In-memory transport
//!
//! Every [`LoopbackRoom`] created from the same [`LoopbackHub`] can see the
//! others. Delivery is immediate (into each member's event channel), which
//! is enough to run several peers in one process for tests and the demo
//! binary. Loss can be simulated per channel, and self-echo can be switched
//! on to exercise origin filtering.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use super::transport::{PeerId, Room, RoomEvent, Transport, TransportError};

/// Largest payload accepted by [`LoopbackRoom::broadcast`].
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

struct Member {
    id: PeerId,
    events: Sender<RoomEvent>,
}

#[derive(Default)]
struct HubState {
    rooms: HashMap<String, Vec<Member>>,
    echo: bool,
    blocked: HashSet<String>,
    next_peer: u64,
    delivered: usize,
    dropped: usize,
}

/// Shared in-process "network".
#[derive(Clone, Default)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Also deliver broadcasts back to their sender.
    pub fn set_echo(&self, echo: bool) {
        self.lock().echo = echo;
    }

    /// Silently drop every message on `channel` while blocked.
    pub fn set_channel_blocked(&self, channel: &str, blocked: bool) {
        let mut state = self.lock();
        if blocked {
            state.blocked.insert(channel.to_string());
        } else {
            state.blocked.remove(channel);
        }
    }

    /// Messages handed to member channels so far.
    pub fn delivered_count(&self) -> usize {
        self.lock().delivered
    }

    /// Messages discarded because their channel was blocked.
    pub fn dropped_count(&self) -> usize {
        self.lock().dropped
    }

    pub fn member_count(&self, room_id: &str) -> usize {
        self.lock().rooms.get(room_id).map_or(0, Vec::len)
    }
}

impl Transport for LoopbackHub {
    fn join(
        &mut self,
        room_id: &str,
        events: Sender<RoomEvent>,
    ) -> Result<Box<dyn Room>, TransportError> {
        let mut state = self.lock();
        state.next_peer += 1;
        let id = PeerId::new(format!("peer-{}", state.next_peer));
        let members = state.rooms.entry(room_id.to_string()).or_default();

        for member in members.iter() {
            let _ = member.events.send(RoomEvent::PeerJoined(id.clone()));
            let _ = events.send(RoomEvent::PeerJoined(member.id.clone()));
        }
        members.push(Member {
            id: id.clone(),
            events,
        });
        debug!(room = room_id, peer = %id, "joined loopback room");

        Ok(Box::new(LoopbackRoom {
            hub: self.clone(),
            room: room_id.to_string(),
            self_id: id,
            joined: true,
        }))
    }
}

/// One member's view of a loopback room.
pub struct LoopbackRoom {
    hub: LoopbackHub,
    room: String,
    self_id: PeerId,
    joined: bool,
}

impl Room for LoopbackRoom {
    fn id(&self) -> &str {
        &self.room
    }

    fn self_id(&self) -> &PeerId {
        &self.self_id
    }

    fn peers(&self) -> Vec<PeerId> {
        if !self.joined {
            return Vec::new();
        }
        let state = self.hub.lock();
        state
            .rooms
            .get(&self.room)
            .map(|members| {
                members
                    .iter()
                    .filter(|m| m.id != self.self_id)
                    .map(|m| m.id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn broadcast(&mut self, channel: &str, payload: &[u8]) -> Result<(), TransportError> {
        if !self.joined {
            return Err(TransportError::NotJoined {
                room: self.room.clone(),
            });
        }
        if payload.len() > MAX_PAYLOAD_BYTES {
            return Err(TransportError::PayloadTooLarge {
                size: payload.len(),
                limit: MAX_PAYLOAD_BYTES,
            });
        }

        let mut state = self.hub.lock();
        if state.blocked.contains(channel) {
            state.dropped += 1;
            trace!(channel, "loopback dropped message on blocked channel");
            return Ok(());
        }
        let echo = state.echo;
        let Some(members) = state.rooms.get(&self.room) else {
            return Err(TransportError::RoomClosed {
                room: self.room.clone(),
            });
        };

        let mut delivered = 0;
        for member in members {
            if member.id == self.self_id && !echo {
                continue;
            }
            let event = RoomEvent::Message {
                channel: channel.to_string(),
                from: self.self_id.clone(),
                payload: payload.to_vec(),
            };
            if member.events.send(event).is_ok() {
                delivered += 1;
            }
        }
        state.delivered += delivered;
        Ok(())
    }

    fn leave(&mut self) {
        if !std::mem::take(&mut self.joined) {
            return;
        }
        let mut state = self.hub.lock();
        if let Some(members) = state.rooms.get_mut(&self.room) {
            members.retain(|m| m.id != self.self_id);
            for member in members.iter() {
                let _ = member.events.send(RoomEvent::PeerLeft(self.self_id.clone()));
            }
            if members.is_empty() {
                state.rooms.remove(&self.room);
            }
        }
        debug!(room = %self.room, peer = %self.self_id, "left loopback room");
    }
}

impl Drop for LoopbackRoom {
    fn drop(&mut self) {
        self.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{Receiver, channel};

    fn join(hub: &mut LoopbackHub) -> (Box<dyn Room>, Receiver<RoomEvent>) {
        let (tx, rx) = channel();
        let room = hub.join("lab", tx).expect("join");
        (room, rx)
    }

    #[test]
    fn test_join_announces_both_directions() {
        let mut hub = LoopbackHub::new();
        let (a, rx_a) = join(&mut hub);
        let (b, rx_b) = join(&mut hub);

        assert_eq!(rx_a.try_recv(), Ok(RoomEvent::PeerJoined(b.self_id().clone())));
        assert_eq!(rx_b.try_recv(), Ok(RoomEvent::PeerJoined(a.self_id().clone())));
        assert_eq!(a.peers(), vec![b.self_id().clone()]);
    }

    #[test]
    fn test_broadcast_skips_sender_unless_echo() {
        let mut hub = LoopbackHub::new();
        let (mut a, rx_a) = join(&mut hub);
        let (_b, rx_b) = join(&mut hub);
        let _ = rx_a.try_recv();
        let _ = rx_b.try_recv();

        a.broadcast("move", b"{}").expect("send");
        assert!(rx_a.try_recv().is_err());
        assert!(matches!(rx_b.try_recv(), Ok(RoomEvent::Message { .. })));

        hub.set_echo(true);
        a.broadcast("move", b"{}").expect("send");
        assert!(matches!(rx_a.try_recv(), Ok(RoomEvent::Message { .. })));
    }

    #[test]
    fn test_blocked_channel_drops_silently() {
        let mut hub = LoopbackHub::new();
        let (mut a, _rx_a) = join(&mut hub);
        let (_b, rx_b) = join(&mut hub);
        let _ = rx_b.try_recv();

        hub.set_channel_blocked("full-sync", true);
        assert!(a.broadcast("full-sync", b"[]").is_ok());
        assert!(rx_b.try_recv().is_err());
        assert_eq!(hub.dropped_count(), 1);
    }

    #[test]
    fn test_leave_notifies_and_is_idempotent() {
        let mut hub = LoopbackHub::new();
        let (mut a, _rx_a) = join(&mut hub);
        let (_b, rx_b) = join(&mut hub);
        let _ = rx_b.try_recv();

        let id = a.self_id().clone();
        a.leave();
        a.leave();
        assert_eq!(rx_b.try_recv(), Ok(RoomEvent::PeerLeft(id)));
        assert!(rx_b.try_recv().is_err(), "second leave must not re-announce");
        assert!(a.broadcast("move", b"{}").is_err());
        assert_eq!(hub.member_count("lab"), 1);
    }
}
