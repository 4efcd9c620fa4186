//! In-memory remote store adapter.
//!
//! Stand-in for the hosted real-time backend: named, keyed collections
//! that push their entire contents to every registered listener on each
//! mutation. Children iterate in key order, matching the backend's
//! key-ordered child iteration.
//!
//! # Delivery model
//!
//! Each subscription gets its own dispatcher thread fed by an mpsc
//! queue. The dispatcher invokes `on_snapshot` for one queued snapshot
//! at a time, so deliveries for a single subscription are serialized
//! even though writers run concurrently. Deliveries across different
//! subscriptions are unordered relative to each other.
//!
//! # Mutex Behavior
//!
//! Collection and listener registries are protected by `Mutex`. A
//! poisoned mutex (from panic in another thread) will cause panic. This
//! fail-fast behavior is intentional for data integrity.

use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread;

use crate::domain::PatientRecord;
use crate::ports::{RemoteStore, Snapshot, StoreObserver, SubscriptionHandle};

/// Error type for in-memory store operations.
#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

enum Delivery {
    Snapshot(Snapshot),
    Error(String),
}

struct Listener {
    tx: Sender<Delivery>,
    handle: SubscriptionHandle,
}

type Children = BTreeMap<String, serde_json::Value>;

/// Named keyed collections with listener fan-out.
#[derive(Default)]
pub struct InMemoryRemoteStore {
    collections: Mutex<HashMap<String, Children>>,
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
}

impl InMemoryRemoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw child value, bypassing record encoding.
    ///
    /// Models another writer having stored a child this front end cannot
    /// necessarily decode.
    pub fn insert_raw(
        &self,
        collection: &str,
        key: impl Into<String>,
        value: serde_json::Value,
    ) {
        self.collections
            .lock()
            .expect("Lock failed")
            .entry(collection.to_string())
            .or_default()
            .insert(key.into(), value);
        self.fan_out(collection);
    }

    /// Remove a child, as an external writer would. Absence surfaces to
    /// listeners with the next snapshot.
    pub fn remove(&self, collection: &str, key: &str) {
        let removed = self
            .collections
            .lock()
            .expect("Lock failed")
            .get_mut(collection)
            .and_then(|children| children.remove(key));
        if removed.is_some() {
            self.fan_out(collection);
        }
    }

    /// Terminate every live stream on `collection` with `reason`, as the
    /// backend does when access is revoked mid-stream. Terminated
    /// listeners are dropped; observing again starts a fresh stream.
    pub fn abort(&self, collection: &str, reason: &str) {
        tracing::warn!("Aborting record streams: {reason}");
        let mut listeners = self.listeners.lock().expect("Lock failed");
        let Some(registered) = listeners.get_mut(collection) else {
            return;
        };
        for listener in registered.drain(..) {
            if !listener.handle.is_cancelled() {
                let _ = listener.tx.send(Delivery::Error(reason.to_string()));
            }
        }
    }

    /// Number of listeners on `collection` that are registered and not
    /// yet cancelled.
    #[must_use]
    pub fn live_listener_count(&self, collection: &str) -> usize {
        self.listeners
            .lock()
            .expect("Lock failed")
            .get(collection)
            .map_or(0, |registered| {
                registered
                    .iter()
                    .filter(|l| !l.handle.is_cancelled())
                    .count()
            })
    }

    fn current_snapshot(&self, collection: &str) -> Snapshot {
        self.collections
            .lock()
            .expect("Lock failed")
            .get(collection)
            .map_or_else(Vec::new, |children| children.values().cloned().collect())
    }

    /// Push the current collection to every live listener, pruning
    /// listeners that were cancelled or whose dispatcher has exited.
    fn fan_out(&self, collection: &str) {
        let snapshot = self.current_snapshot(collection);
        let mut listeners = self.listeners.lock().expect("Lock failed");
        let Some(registered) = listeners.get_mut(collection) else {
            return;
        };
        registered.retain(|listener| {
            if listener.handle.is_cancelled() {
                return false;
            }
            listener
                .tx
                .send(Delivery::Snapshot(snapshot.clone()))
                .is_ok()
        });
    }
}

impl RemoteStore for InMemoryRemoteStore {
    type Error = MemoryStoreError;

    fn write(
        &self,
        collection: &str,
        key: &str,
        record: &PatientRecord,
    ) -> Result<(), Self::Error> {
        let value = serde_json::to_value(record)?;
        self.collections
            .lock()
            .expect("Lock failed")
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self.fan_out(collection);
        Ok(())
    }

    fn observe(&self, collection: &str, mut observer: StoreObserver) -> SubscriptionHandle {
        let handle = SubscriptionHandle::new();
        let (tx, rx) = mpsc::channel();

        let dispatcher_handle = handle.clone();
        thread::spawn(move || {
            for delivery in rx {
                if dispatcher_handle.is_cancelled() {
                    break;
                }
                match delivery {
                    Delivery::Snapshot(snapshot) => (observer.on_snapshot)(snapshot),
                    Delivery::Error(reason) => {
                        (observer.on_error)(reason);
                        break;
                    }
                }
            }
        });

        // Queue the initial snapshot and register under the listener
        // lock, so a write racing with registration cannot slip between
        // the two: a fresh observer always sees the current collection,
        // empty or not.
        let mut listeners = self.listeners.lock().expect("Lock failed");
        let initial = self.current_snapshot(collection);
        let _ = tx.send(Delivery::Snapshot(initial));
        listeners
            .entry(collection.to_string())
            .or_default()
            .push(Listener {
                tx,
                handle: handle.clone(),
            });
        drop(listeners);
        handle
    }
}
