//! EventHub: room-routed fan-out of committed floor events
//!
//! ```text
//! WorkOrderService / DowntimeManager
//!       │ FloorEvent (after commit)
//!       ▼
//! EventHub
//!   ├── last_versions: entity → last published version (drops stale events)
//!   ├── rooms: room → observer ids
//!   └── observers: id → bounded mpsc sender + joined rooms + lagged flag
//!         │ try_send
//!         ▼
//!   WS sessions (one per connected dashboard / terminal)
//! ```
//!
//! Recipients of an event are the members of any room the event is tagged
//! with, plus every observer that has not joined a room.

use dashmap::DashMap;
use shared::message::{EntityKey, FloorEvent};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

pub type ObserverId = u64;

/// Default per-observer buffer
pub const DEFAULT_OBSERVER_CAPACITY: usize = 256;

/// Handle returned by [`EventHub::subscribe`]
pub struct Subscription {
    pub id: ObserverId,
    pub rx: mpsc::Receiver<FloorEvent>,
}

struct ObserverSlot {
    tx: mpsc::Sender<FloorEvent>,
    rooms: HashSet<String>,
    /// Set when an event was dropped because the channel was full
    lagged: AtomicBool,
}

pub struct EventHub {
    observers: DashMap<ObserverId, ObserverSlot>,
    rooms: DashMap<String, HashSet<ObserverId>>,
    last_versions: DashMap<EntityKey, u64>,
    next_id: AtomicU64,
    capacity: usize,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            observers: DashMap::new(),
            rooms: DashMap::new(),
            last_versions: DashMap::new(),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    /// Register a new observer (initially in no room, so it receives everything)
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.capacity);
        self.observers.insert(
            id,
            ObserverSlot {
                tx,
                rooms: HashSet::new(),
                lagged: AtomicBool::new(false),
            },
        );
        tracing::debug!(observer_id = id, "Observer subscribed");
        Subscription { id, rx }
    }

    /// Remove an observer and its room memberships
    pub fn unsubscribe(&self, id: ObserverId) {
        let Some((_, slot)) = self.observers.remove(&id) else {
            return;
        };
        for room in &slot.rooms {
            self.remove_member(room, id);
        }
        tracing::debug!(observer_id = id, "Observer unsubscribed");
    }

    /// Join a room. Returns false for unknown observers.
    pub fn join(&self, id: ObserverId, room: &str) -> bool {
        {
            let Some(mut slot) = self.observers.get_mut(&id) else {
                return false;
            };
            slot.rooms.insert(room.to_string());
        }
        self.rooms.entry(room.to_string()).or_default().insert(id);
        tracing::debug!(observer_id = id, room = %room, "Observer joined room");
        true
    }

    /// Leave a room. Returns false for unknown observers.
    pub fn leave(&self, id: ObserverId, room: &str) -> bool {
        {
            let Some(mut slot) = self.observers.get_mut(&id) else {
                return false;
            };
            slot.rooms.remove(room);
        }
        self.remove_member(room, id);
        tracing::debug!(observer_id = id, room = %room, "Observer left room");
        true
    }

    fn remove_member(&self, room: &str, id: ObserverId) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(&id);
        }
        self.rooms.remove_if(room, |_, members| members.is_empty());
    }

    /// Publish a committed event. Never blocks; returns the number of
    /// observers the event was queued for.
    ///
    /// Events whose version is not newer than the last one published for the
    /// same entity are dropped.
    pub fn publish(&self, event: FloorEvent) -> usize {
        let version = event.version();
        let mut closed = Vec::new();

        let delivered = {
            // Held through delivery so same-entity events go out in version order
            let mut last = self.last_versions.entry(event.entity_key()).or_insert(0);
            if *last >= version {
                tracing::debug!(event = %event, last_version = *last, "Dropping stale event");
                return 0;
            }
            *last = version;

            let mut delivered = 0;
            for id in self.recipients(&event) {
                let Some(slot) = self.observers.get(&id) else {
                    continue;
                };
                match slot.tx.try_send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        slot.lagged.store(true, Ordering::Release);
                        tracing::warn!(observer_id = id, event = %event, "Observer lagging, event dropped");
                    }
                    Err(TrySendError::Closed(_)) => closed.push(id),
                }
            }
            delivered
        };

        for id in closed {
            self.unsubscribe(id);
        }

        tracing::debug!(event = %event, delivered, "Event published");
        delivered
    }

    fn recipients(&self, event: &FloorEvent) -> HashSet<ObserverId> {
        let mut ids = HashSet::new();
        for room in event.rooms() {
            if let Some(members) = self.rooms.get(&room) {
                ids.extend(members.iter().copied());
            }
        }
        for entry in self.observers.iter() {
            if entry.rooms.is_empty() {
                ids.insert(*entry.key());
            }
        }
        ids
    }

    /// Clear and return the observer's lagged flag
    pub fn take_lagged(&self, id: ObserverId) -> bool {
        self.observers
            .get(&id)
            .map(|slot| slot.lagged.swap(false, Ordering::AcqRel))
            .unwrap_or(false)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Current members of `room`
    pub fn room_size(&self, room: &str) -> usize {
        self.rooms.get(room).map(|m| m.len()).unwrap_or(0)
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_OBSERVER_CAPACITY)
    }
}
