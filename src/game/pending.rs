//! Deferred mutation queue
//!
//! Transport callbacks, asset completions and timers never touch the world
//! directly. They land here and the scene drains them at the start of each
//! frame, so every mutation happens at a known point of the frame loop.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::assets::{AssetCallback, AssetResult};
use crate::net::RoomEvent;
use crate::time::Millis;

/// Id of an outstanding asset request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadRequest(u64);

/// A finished asset request.
#[derive(Debug)]
pub struct AssetCompletion {
    pub request: LoadRequest,
    pub result: AssetResult,
}

/// Timed work scheduled by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    /// Broadcast a target snapshot
    SendFullSync,
    /// Pop the pressure button back up
    ReleaseButton,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    due: Millis,
    seq: u64,
    task: DeferredTask,
}

/// Inbound channels plus pending timers.
pub struct PendingQueue {
    room_tx: Sender<RoomEvent>,
    room_rx: Receiver<RoomEvent>,
    asset_tx: Sender<AssetCompletion>,
    asset_rx: Receiver<AssetCompletion>,
    timers: Vec<Timer>,
    next_request: u64,
    next_seq: u64,
}

impl Default for PendingQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingQueue {
    pub fn new() -> Self {
        let (room_tx, room_rx) = mpsc::channel();
        let (asset_tx, asset_rx) = mpsc::channel();
        Self {
            room_tx,
            room_rx,
            asset_tx,
            asset_rx,
            timers: Vec::new(),
            next_request: 0,
            next_seq: 0,
        }
    }

    /// Sender handed to the transport when joining a room.
    pub fn room_sender(&self) -> Sender<RoomEvent> {
        self.room_tx.clone()
    }

    /// Allocate a request id and a callback that forwards into the queue.
    pub fn asset_callback(&mut self) -> (LoadRequest, AssetCallback) {
        self.next_request += 1;
        let request = LoadRequest(self.next_request);
        let tx = self.asset_tx.clone();
        let callback: AssetCallback = Box::new(move |result| {
            // The scene may already be gone; a closed queue just drops the asset.
            let _ = tx.send(AssetCompletion { request, result });
        });
        (request, callback)
    }

    /// Run `task` on the first frame at or after `due`.
    pub fn schedule(&mut self, due: Millis, task: DeferredTask) {
        self.next_seq += 1;
        self.timers.push(Timer {
            due,
            seq: self.next_seq,
            task,
        });
    }

    /// Whether a `task` is already waiting.
    pub fn is_scheduled(&self, task: DeferredTask) -> bool {
        self.timers.iter().any(|t| t.task == task)
    }

    /// Remove and return every task due at `now`, oldest first.
    pub fn take_due(&mut self, now: Millis) -> Vec<DeferredTask> {
        let mut due: Vec<Timer> = Vec::new();
        self.timers.retain(|t| {
            if t.due <= now {
                due.push(*t);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|t| (t.due, t.seq));
        due.into_iter().map(|t| t.task).collect()
    }

    pub fn drain_room(&self) -> Vec<RoomEvent> {
        self.room_rx.try_iter().collect()
    }

    pub fn drain_assets(&self) -> Vec<AssetCompletion> {
        self.asset_rx.try_iter().collect()
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Forget timers and anything already queued.
    pub fn clear(&mut self) {
        self.timers.clear();
        self.room_rx.try_iter().for_each(drop);
        self.asset_rx.try_iter().for_each(drop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ModelAsset;
    use crate::net::PeerId;

    #[test]
    fn test_timers_fire_in_due_order() {
        let mut queue = PendingQueue::new();
        queue.schedule(1000, DeferredTask::SendFullSync);
        queue.schedule(200, DeferredTask::ReleaseButton);

        assert!(queue.take_due(199).is_empty());
        assert_eq!(queue.take_due(5000), vec![
            DeferredTask::ReleaseButton,
            DeferredTask::SendFullSync
        ]);
        assert_eq!(queue.timer_count(), 0);
    }

    #[test]
    fn test_asset_callback_lands_in_queue() {
        let mut queue = PendingQueue::new();
        let (request, callback) = queue.asset_callback();
        callback(Ok(ModelAsset {
            path: "m".into(),
            clips: vec![],
        }));
        let done = queue.drain_assets();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].request, request);
    }

    #[test]
    fn test_clear_discards_pending_events() {
        let mut queue = PendingQueue::new();
        let _ = queue.room_sender().send(RoomEvent::PeerJoined(PeerId::new("x")));
        queue.schedule(0, DeferredTask::SendFullSync);
        queue.clear();
        assert!(queue.drain_room().is_empty());
        assert_eq!(queue.timer_count(), 0);
    }
}
