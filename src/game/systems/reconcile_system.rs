//! Reconciliation scheduling.
//!
//! Decides who seeds the shared targets and when a `full-sync` snapshot
//! goes out. Receivers replace their target list wholesale, so the world
//! converges whenever a snapshot lands after the last divergence.

use tracing::debug;

use crate::game::config::NetworkConfig;
use crate::game::pending::{DeferredTask, PendingQueue};
use crate::time::{Interval, Millis};

/// How this peer entered the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncRole {
    /// Room was empty: this peer creates the initial targets
    Seeder,
    /// Others were already present
    Joiner,
}

/// Schedules periodic and event-driven snapshots.
#[derive(Debug)]
pub struct ReconcileSystem {
    interval: Interval,
    initial_delay_ms: Millis,
    role: Option<SyncRole>,
    snapshots_sent: usize,
}

impl ReconcileSystem {
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            interval: Interval::new(config.sync_interval_ms, 0),
            initial_delay_ms: config.initial_sync_delay_ms,
            role: None,
            snapshots_sent: 0,
        }
    }

    /// Pick the role for a fresh session and arm the timers.
    ///
    /// A seeder also gets a one-off snapshot after the initial delay.
    pub fn start(&mut self, other_peers: usize, now: Millis, queue: &mut PendingQueue) -> SyncRole {
        let role = if other_peers == 0 {
            SyncRole::Seeder
        } else {
            SyncRole::Joiner
        };
        self.role = Some(role);
        self.interval.restart(now);
        if role == SyncRole::Seeder {
            queue.schedule(now + self.initial_delay_ms, DeferredTask::SendFullSync);
        }
        debug!(?role, other_peers, "reconciliation started");
        role
    }

    /// Someone joined: send them a snapshot soon rather than on the next tick.
    pub fn on_peer_joined(&mut self, now: Millis, queue: &mut PendingQueue) {
        if !queue.is_scheduled(DeferredTask::SendFullSync) {
            queue.schedule(now + self.initial_delay_ms, DeferredTask::SendFullSync);
        }
    }

    /// Periodic check. `true` when a snapshot should be broadcast now.
    ///
    /// Peers without world state never send, so a fresh joiner cannot
    /// wipe the room with an empty list.
    pub fn tick(&mut self, now: Millis, has_world_state: bool, other_peers: usize) -> bool {
        self.interval.tick(now) && Self::may_send(has_world_state, other_peers)
    }

    /// Gate for the deferred snapshot (sent even into an empty room).
    pub fn may_send_deferred(has_world_state: bool) -> bool {
        has_world_state
    }

    fn may_send(has_world_state: bool, other_peers: usize) -> bool {
        has_world_state && other_peers > 0
    }

    pub fn note_sent(&mut self) {
        self.snapshots_sent += 1;
    }

    pub fn role(&self) -> Option<SyncRole> {
        self.role
    }

    pub fn snapshots_sent(&self) -> usize {
        self.snapshots_sent
    }

    pub fn reset(&mut self) {
        self.role = None;
        self.snapshots_sent = 0;
        self.interval.restart(0);
    }
}
