//! Background workers for blocking collaborator calls.
//!
//! Collaborator calls suspend on network I/O, so they run on short-lived
//! worker threads. Each call publishes exactly one terminal outcome over
//! an mpsc channel; the orchestrator polls the handle from the
//! controlling thread.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::application::{RecordClient, SessionStore};
use crate::domain::{Credentials, Identity, PatientRecord};
use crate::ports::{IdentityService, RemoteStore};
use crate::WardlinkError;

/// Terminal outcome of one sign-in, sign-up or sign-out call.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    SignedIn(Identity),
    SignedOut,
    /// The reason text only; callers compose the user-facing message.
    Failed(String),
}

/// Terminal outcome of one record upsert.
#[derive(Debug, Clone)]
pub enum UpsertOutcome {
    Saved(PatientRecord),
    Failed(String),
}

/// Event pushed by the live record subscription.
#[derive(Debug, Clone)]
pub enum RecordsEvent {
    Snapshot(Vec<PatientRecord>),
    StreamError(String),
}

/// Handle to a running authentication task.
pub struct AuthTaskHandle {
    outcome_rx: Receiver<AuthOutcome>,
    _handle: JoinHandle<()>,
}

impl AuthTaskHandle {
    /// Try to receive the terminal outcome (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<AuthOutcome> {
        self.outcome_rx.try_recv().ok()
    }
}

/// Handle to a running upsert task.
pub struct UpsertTaskHandle {
    outcome_rx: Receiver<UpsertOutcome>,
    _handle: JoinHandle<()>,
}

impl UpsertTaskHandle {
    /// Try to receive the terminal outcome (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<UpsertOutcome> {
        self.outcome_rx.try_recv().ok()
    }
}

/// Extract the collaborator/validation reason from a crate error.
fn reason_of(err: &WardlinkError) -> String {
    match err {
        WardlinkError::Validation(reason)
        | WardlinkError::Auth(reason)
        | WardlinkError::StoreWrite(reason)
        | WardlinkError::StoreObserve(reason) => reason.clone(),
        other => other.to_string(),
    }
}

/// Spawns authentication tasks.
pub struct AuthWorker;

impl AuthWorker {
    /// Spawn a background sign-in.
    pub fn spawn_sign_in<I>(
        session: Arc<SessionStore<I>>,
        credentials: Credentials,
    ) -> AuthTaskHandle
    where
        I: IdentityService + 'static,
    {
        Self::spawn(move |tx| {
            let outcome = match session.sign_in(&credentials.email, &credentials.password) {
                Ok(identity) => AuthOutcome::SignedIn(identity),
                Err(e) => AuthOutcome::Failed(reason_of(&e)),
            };
            let _ = tx.send(outcome);
        })
    }

    /// Spawn a background sign-up.
    pub fn spawn_sign_up<I>(
        session: Arc<SessionStore<I>>,
        credentials: Credentials,
    ) -> AuthTaskHandle
    where
        I: IdentityService + 'static,
    {
        Self::spawn(move |tx| {
            let outcome = match session.sign_up(&credentials.email, &credentials.password) {
                Ok(identity) => AuthOutcome::SignedIn(identity),
                Err(e) => AuthOutcome::Failed(reason_of(&e)),
            };
            let _ = tx.send(outcome);
        })
    }

    /// Spawn a background sign-out. Always completes with `SignedOut`.
    pub fn spawn_sign_out<I>(session: Arc<SessionStore<I>>) -> AuthTaskHandle
    where
        I: IdentityService + 'static,
    {
        Self::spawn(move |tx| {
            session.sign_out();
            let _ = tx.send(AuthOutcome::SignedOut);
        })
    }

    fn spawn<F>(task: F) -> AuthTaskHandle
    where
        F: FnOnce(Sender<AuthOutcome>) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || task(tx));
        AuthTaskHandle {
            outcome_rx: rx,
            _handle: handle,
        }
    }
}

/// Spawns record upsert tasks.
pub struct UpsertWorker;

impl UpsertWorker {
    /// Spawn a background upsert of `record`.
    pub fn spawn<R>(client: Arc<RecordClient<R>>, record: PatientRecord) -> UpsertTaskHandle
    where
        R: RemoteStore + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let outcome = match client.upsert(&record) {
                Ok(()) => UpsertOutcome::Saved(record),
                Err(e) => UpsertOutcome::Failed(reason_of(&e)),
            };
            let _ = tx.send(outcome);
        });
        UpsertTaskHandle {
            outcome_rx: rx,
            _handle: handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRemoteStore;
    use crate::adapters::sqlite::SqliteIdentityService;
    use std::time::{Duration, Instant};

    fn wait_auth(handle: &AuthTaskHandle) -> AuthOutcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(outcome) = handle.try_recv() {
                return outcome;
            }
            assert!(Instant::now() < deadline, "Worker never completed");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_sign_up_delivers_exactly_one_terminal_outcome() {
        let provider = Arc::new(SqliteIdentityService::in_memory().expect("Should create db"));
        let session = Arc::new(SessionStore::new(provider));

        let handle = AuthWorker::spawn_sign_up(
            session,
            Credentials::for_registration("a@b.com", "secret1", "secret1"),
        );

        match wait_auth(&handle) {
            AuthOutcome::SignedIn(identity) => assert!(!identity.uid.is_empty()),
            other => panic!("Expected SignedIn, got {other:?}"),
        }
        // Terminal means terminal: nothing further arrives.
        thread::sleep(Duration::from_millis(20));
        assert!(handle.try_recv().is_none());
    }

    #[test]
    fn test_failed_sign_in_carries_reason_only() {
        let provider = Arc::new(SqliteIdentityService::in_memory().expect("Should create db"));
        let session = Arc::new(SessionStore::new(provider));

        let handle =
            AuthWorker::spawn_sign_in(session, Credentials::for_login("a@b.com", "nope12"));

        match wait_auth(&handle) {
            AuthOutcome::Failed(reason) => {
                assert!(!reason.contains("Authentication failed"));
                assert!(!reason.is_empty());
            }
            other => panic!("Expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_upsert_worker_saves_record() {
        let store = Arc::new(InMemoryRemoteStore::new());
        let client = Arc::new(RecordClient::new(store));

        let record = PatientRecord::new("P1", "Jane", "j@x.com", "40", "flu");
        let handle = UpsertWorker::spawn(client, record.clone());

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(outcome) = handle.try_recv() {
                match outcome {
                    UpsertOutcome::Saved(saved) => assert_eq!(saved, record),
                    UpsertOutcome::Failed(reason) => panic!("Upsert failed: {reason}"),
                }
                break;
            }
            assert!(Instant::now() < deadline, "Worker never completed");
            thread::sleep(Duration::from_millis(2));
        }
    }
}
