//! Remote store port.
//!
//! Abstracts the remote real-time key-value backend holding the patient
//! collection. The backend pushes the *entire* collection on every
//! remote mutation rather than incremental diffs; children arrive as
//! opaque values and are decoded by the record client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::domain::PatientRecord;

/// Collection name the patient records live under. Part of the contract
/// with the remote backend; other front ends read the same path.
pub const PATIENTS_COLLECTION: &str = "patients";

/// One full-collection push: the ordered children of the collection at
/// the moment of the triggering mutation. Order is the backend's
/// child-iteration order.
pub type Snapshot = Vec<serde_json::Value>;

/// Callback pair registered with [`RemoteStore::observe`].
///
/// For a given subscription the store invokes `on_snapshot` serially:
/// a new delivery is not started until the previous call returns, even
/// though the underlying transport is asynchronous.
pub struct StoreObserver {
    /// Invoked once per remote change event with the full collection.
    pub on_snapshot: Box<dyn FnMut(Snapshot) + Send>,
    /// Invoked when the stream itself fails (e.g. permission revoked).
    pub on_error: Box<dyn FnMut(String) + Send>,
}

/// Cancellation token for a live observation.
///
/// Cancellation takes effect no later than the next delivery boundary;
/// a delivery already dispatched when `unsubscribe` is called may still
/// be observed.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionHandle {
    cancelled: Arc<AtomicBool>,
}

impl SubscriptionHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop delivery. Safe to call multiple times; no-op after the first.
    pub fn unsubscribe(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Trait for the remote store collaborator.
pub trait RemoteStore: Send + Sync {
    /// Error type for write operations. Its display text is surfaced to
    /// the user verbatim.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Write `record` at `key` within `collection`, unconditionally
    /// overwriting any existing value at that key.
    ///
    /// # Errors
    /// Returns error on network or permission failure. Failures are
    /// terminal per call; any retry policy belongs to the caller.
    fn write(
        &self,
        collection: &str,
        key: &str,
        record: &PatientRecord,
    ) -> Result<(), Self::Error>;

    /// Register a continuous listener against the whole of `collection`.
    ///
    /// The observer immediately receives one snapshot of the current
    /// collection (an empty collection yields one empty snapshot), then
    /// one snapshot per remote change event, in the order changes occur.
    fn observe(&self, collection: &str, observer: StoreObserver) -> SubscriptionHandle;
}
