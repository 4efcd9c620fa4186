//! Record client: Keyed writes and live observation of the patient
//! collection.
//!
//! Every remote mutation re-delivers the entire collection; the client
//! decodes the opaque children into [`PatientRecord`] values, skipping
//! any child that does not decode. The client also bounds the number of
//! live listeners: subscribing again tears down the previous
//! subscription first.

use std::sync::{Arc, Mutex};

use crate::domain::PatientRecord;
use crate::ports::{
    RemoteStore, Snapshot, StoreObserver, SubscriptionHandle, PATIENTS_COLLECTION,
};
use crate::{Result, WardlinkError};

/// Client for the remote patient collection.
pub struct RecordClient<R>
where
    R: RemoteStore,
{
    store: Arc<R>,
    active: Mutex<Option<SubscriptionHandle>>,
}

impl<R> RecordClient<R>
where
    R: RemoteStore,
{
    #[must_use]
    pub fn new(store: Arc<R>) -> Self {
        Self {
            store,
            active: Mutex::new(None),
        }
    }

    /// Write `record` at key `record.id`, overwriting any existing record
    /// under that key. This is a silent upsert: an existing record is
    /// replaced, not an error.
    ///
    /// # Errors
    /// Returns `StoreWrite` on network or permission failure. No retry is
    /// attempted.
    pub fn upsert(&self, record: &PatientRecord) -> Result<()> {
        self.store
            .write(PATIENTS_COLLECTION, &record.id, record)
            .map_err(|e| WardlinkError::StoreWrite(e.to_string()))?;
        tracing::debug!(id = %record.id, "Record written");
        Ok(())
    }

    /// Register a live listener on the whole collection.
    ///
    /// `on_records` receives the decoded, order-preserving collection
    /// once per remote change event; deliveries are serialized. A fresh
    /// observer receives the current collection immediately, so an empty
    /// collection yields exactly one empty sequence. `on_error` receives
    /// stream-level failures with the backend's reason text.
    ///
    /// Any previous subscription held by this client is unsubscribed
    /// first, keeping the live listener count at one per client.
    pub fn subscribe<F, E>(&self, mut on_records: F, on_error: E) -> SubscriptionHandle
    where
        F: FnMut(Vec<PatientRecord>) + Send + 'static,
        E: FnMut(String) + Send + 'static,
    {
        let observer = StoreObserver {
            on_snapshot: Box::new(move |snapshot| on_records(decode_snapshot(snapshot))),
            on_error: Box::new(on_error),
        };

        let handle = self.store.observe(PATIENTS_COLLECTION, observer);

        let mut active = self.active.lock().expect("Lock failed");
        if let Some(previous) = active.replace(handle.clone()) {
            previous.unsubscribe();
        }
        handle
    }

    /// Cancel the active subscription. No-op when none is active; safe to
    /// call multiple times.
    pub fn unsubscribe(&self) {
        if let Some(handle) = self.active.lock().expect("Lock failed").take() {
            handle.unsubscribe();
        }
    }

    /// Whether this client currently holds a live subscription.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.active
            .lock()
            .expect("Lock failed")
            .as_ref()
            .is_some_and(|h| !h.is_cancelled())
    }
}

/// Decode the opaque children of a snapshot, preserving order.
///
/// Undecodable children are skipped; a snapshot where nothing decodes
/// looks the same to consumers as an empty collection.
fn decode_snapshot(snapshot: Snapshot) -> Vec<PatientRecord> {
    let mut records = Vec::with_capacity(snapshot.len());
    for child in &snapshot {
        match PatientRecord::from_child(child) {
            Some(record) => records.push(record),
            None => tracing::warn!("Skipping undecodable child in patient snapshot"),
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRemoteStore;
    use serde_json::json;
    use std::sync::mpsc;
    use std::time::Duration;

    fn recv_records(rx: &mpsc::Receiver<Vec<PatientRecord>>) -> Vec<PatientRecord> {
        rx.recv_timeout(Duration::from_secs(2))
            .expect("Should receive a snapshot")
    }

    #[test]
    fn test_upsert_overwrites_in_place() {
        let store = Arc::new(InMemoryRemoteStore::new());
        let client = RecordClient::new(store.clone());

        let first = PatientRecord::new("P1", "Jane", "j@x.com", "40", "flu");
        let second = PatientRecord::new("P1", "Jane Doe", "j@x.com", "41", "flu");

        client.upsert(&first).expect("First write should succeed");
        client.upsert(&second).expect("Second write should succeed");

        let (tx, rx) = mpsc::channel();
        client.subscribe(move |records| tx.send(records).expect("Send failed"), |_| {});

        let records = recv_records(&rx);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], second);
    }

    #[test]
    fn test_empty_collection_yields_one_empty_snapshot() {
        let store = Arc::new(InMemoryRemoteStore::new());
        let client = RecordClient::new(store);

        let (tx, rx) = mpsc::channel();
        client.subscribe(move |records| tx.send(records).expect("Send failed"), |_| {});

        assert!(recv_records(&rx).is_empty());
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_malformed_children_are_skipped() {
        let store = Arc::new(InMemoryRemoteStore::new());
        store.insert_raw(PATIENTS_COLLECTION, "BAD", json!({ "unexpected": true }));
        let client = RecordClient::new(store.clone());

        let record = PatientRecord::new("P1", "Jane", "j@x.com", "40", "flu");
        client.upsert(&record).expect("Write should succeed");

        let (tx, rx) = mpsc::channel();
        client.subscribe(move |records| tx.send(records).expect("Send failed"), |_| {});

        let records = recv_records(&rx);
        assert_eq!(records, vec![record]);
    }

    #[test]
    fn test_resubscribe_bounds_listeners_to_one() {
        let store = Arc::new(InMemoryRemoteStore::new());
        let client = RecordClient::new(store.clone());

        for _ in 0..5 {
            let handle = client.subscribe(|_| {}, |_| {});
            assert!(!handle.is_cancelled());
        }
        assert_eq!(store.live_listener_count(PATIENTS_COLLECTION), 1);

        client.unsubscribe();
        client.unsubscribe();
        assert!(!client.is_subscribed());
        assert_eq!(store.live_listener_count(PATIENTS_COLLECTION), 0);
    }

    #[test]
    fn test_external_removal_surfaces_as_absence() {
        let store = Arc::new(InMemoryRemoteStore::new());
        let client = RecordClient::new(store.clone());

        let record = PatientRecord::new("P1", "Jane", "j@x.com", "40", "flu");
        client.upsert(&record).expect("Write should succeed");

        let (tx, rx) = mpsc::channel();
        client.subscribe(move |records| tx.send(records).expect("Send failed"), |_| {});
        assert_eq!(recv_records(&rx).len(), 1);

        store.remove(PATIENTS_COLLECTION, "P1");
        assert!(recv_records(&rx).is_empty());
    }

    #[test]
    fn test_stream_error_reaches_on_error() {
        let store = Arc::new(InMemoryRemoteStore::new());
        let client = RecordClient::new(store.clone());

        let (tx, rx) = mpsc::channel();
        client.subscribe(
            |_| {},
            move |message| tx.send(message).expect("Send failed"),
        );

        store.abort(PATIENTS_COLLECTION, "Permission denied");
        let message = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("Should receive stream error");
        assert!(message.contains("Permission denied"));
    }
}
