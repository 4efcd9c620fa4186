//! Application orchestrator.
//!
//! Wires the session store, the form state machines and the record
//! client to the top-level commands (login, register, logout,
//! add-patient, toggle-records-view). All collaborator I/O runs on
//! workers; `poll()` applies their terminal outcomes and the pushed
//! record snapshots on the controlling thread.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use crate::application::{RecordClient, RecordListCache, SessionStore, MIN_PASSWORD_LEN};
use crate::domain::PatientRecord;
use crate::ports::{IdentityService, RemoteStore};

use super::forms::{AuthFormState, FormMode, PatientFormState};
use super::projection::{project, SessionUiState, UiProjection};
use super::worker::{
    AuthOutcome, AuthTaskHandle, AuthWorker, RecordsEvent, UpsertOutcome, UpsertTaskHandle,
    UpsertWorker,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthKind {
    Login,
    Register,
    Logout,
}

struct PendingAuth {
    kind: AuthKind,
    handle: AuthTaskHandle,
}

/// Top-level application state.
pub struct App<I, R>
where
    I: IdentityService + 'static,
    R: RemoteStore + 'static,
{
    session: Arc<SessionStore<I>>,
    records: Arc<RecordClient<R>>,

    auth_form: AuthFormState,
    patient_form: PatientFormState,
    cache: RecordListCache,

    records_visible: bool,
    notice: Option<String>,

    pending_auth: Option<PendingAuth>,
    pending_upsert: Option<UpsertTaskHandle>,
    records_events: Option<Receiver<RecordsEvent>>,
}

impl<I, R> App<I, R>
where
    I: IdentityService + 'static,
    R: RemoteStore + 'static,
{
    /// Create the application with injected services (composition root).
    ///
    /// A session the identity provider persisted is already live at this
    /// point, so the app may start logged in.
    #[must_use]
    pub fn new(session: Arc<SessionStore<I>>, records: Arc<RecordClient<R>>) -> Self {
        Self {
            session,
            records,
            auth_form: AuthFormState::default(),
            patient_form: PatientFormState::default(),
            cache: RecordListCache::new(),
            records_visible: false,
            notice: None,
            pending_auth: None,
            pending_upsert: None,
            records_events: None,
        }
    }

    /// Derived screen state: logged in iff an identity is live.
    #[must_use]
    pub fn ui_state(&self) -> SessionUiState {
        if self.session.current_identity().is_some() {
            SessionUiState::LoggedIn
        } else {
            SessionUiState::LoggedOut
        }
    }

    /// Whether an auth or upsert call is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending_auth.is_some() || self.pending_upsert.is_some()
    }

    /// Project the current state to visible elements.
    #[must_use]
    pub fn projection(&self) -> UiProjection {
        project(
            self.ui_state(),
            &self.auth_form,
            self.is_busy(),
            self.records_visible,
        )
    }

    #[must_use]
    pub fn auth_form(&self) -> &AuthFormState {
        &self.auth_form
    }

    pub fn auth_form_mut(&mut self) -> &mut AuthFormState {
        &mut self.auth_form
    }

    #[must_use]
    pub fn patient_form(&self) -> &PatientFormState {
        &self.patient_form
    }

    pub fn patient_form_mut(&mut self) -> &mut PatientFormState {
        &mut self.patient_form
    }

    /// The locally mirrored record list, in delivery order.
    #[must_use]
    pub fn records(&self) -> &[PatientRecord] {
        self.cache.records()
    }

    #[must_use]
    pub fn records_visible(&self) -> bool {
        self.records_visible
    }

    /// The most recent user-facing message, if unread.
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Consume the most recent user-facing message.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    fn set_notice(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
    }

    /// Primary control on the auth card. Signs in while in login mode;
    /// while registering, the same control cancels registration.
    pub fn login(&mut self) {
        if self.auth_form.mode() == FormMode::Registering {
            self.auth_form.cancel_registration();
            return;
        }
        if self.pending_auth.is_some() {
            return;
        }
        if self.auth_form.email.is_empty() || self.auth_form.password().is_empty() {
            self.set_notice("Please fill all fields");
            return;
        }

        let handle = AuthWorker::spawn_sign_in(self.session.clone(), self.auth_form.credentials());
        self.pending_auth = Some(PendingAuth {
            kind: AuthKind::Login,
            handle,
        });
    }

    /// Secondary control on the auth card. Switches to registration
    /// mode first; while registering, submits the sign-up attempt.
    pub fn register(&mut self) {
        if self.auth_form.mode() == FormMode::Login {
            self.auth_form.switch_to_register();
            return;
        }
        if self.pending_auth.is_some() {
            return;
        }

        let credentials = self.auth_form.credentials();
        if credentials.email.is_empty()
            || credentials.password.is_empty()
            || credentials.confirm.is_empty()
        {
            self.set_notice("Please fill all fields");
            return;
        }
        if !credentials.passwords_match() {
            self.set_notice("Passwords do not match");
            return;
        }
        if credentials.password.len() < MIN_PASSWORD_LEN {
            self.set_notice(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            ));
            return;
        }

        let handle = AuthWorker::spawn_sign_up(self.session.clone(), credentials);
        self.pending_auth = Some(PendingAuth {
            kind: AuthKind::Register,
            handle,
        });
    }

    /// Explicit cancel control while registering.
    pub fn cancel_registration(&mut self) {
        self.auth_form.cancel_registration();
    }

    /// Close the session.
    pub fn logout(&mut self) {
        if self.pending_auth.is_some() {
            return;
        }
        let handle = AuthWorker::spawn_sign_out(self.session.clone());
        self.pending_auth = Some(PendingAuth {
            kind: AuthKind::Logout,
            handle,
        });
    }

    /// Submit the patient entry form.
    pub fn add_patient(&mut self) {
        if self.ui_state() != SessionUiState::LoggedIn {
            return;
        }
        if self.pending_upsert.is_some() {
            return;
        }
        if !self.patient_form.is_complete() {
            self.set_notice("Please fill all patient fields");
            return;
        }

        let record = self.patient_form.to_record();
        self.pending_upsert = Some(UpsertWorker::spawn(self.records.clone(), record));
    }

    /// Show or hide the record list. Revealing re-subscribes; hiding
    /// cancels the subscription.
    pub fn toggle_records(&mut self) {
        if self.ui_state() != SessionUiState::LoggedIn {
            return;
        }
        if self.records_visible {
            self.records_visible = false;
            self.records.unsubscribe();
            self.records_events = None;
        } else {
            self.reveal_records();
        }
    }

    /// Drain worker and subscription channels and apply terminal
    /// outcomes. Call from the controlling thread.
    pub fn poll(&mut self) {
        self.poll_auth();
        self.poll_upsert();
        self.poll_records();
    }

    /// Subscribe anew and mark the list visible. The client tears down
    /// any previous listener, so the live count stays at one.
    fn reveal_records(&mut self) {
        let (tx, rx) = mpsc::channel();
        let err_tx = tx.clone();
        self.records.subscribe(
            move |records| {
                let _ = tx.send(RecordsEvent::Snapshot(records));
            },
            move |reason| {
                let _ = err_tx.send(RecordsEvent::StreamError(reason));
            },
        );
        self.records_events = Some(rx);
        self.records_visible = true;
    }

    fn enter_patient_management(&mut self) {
        self.patient_form.clear();
        self.cache.clear();
        self.records_visible = false;
        self.records.unsubscribe();
        self.records_events = None;
    }

    fn show_login_form(&mut self) {
        self.auth_form.cancel_registration();
        self.patient_form.clear();
        self.cache.clear();
        self.records_visible = false;
        self.records.unsubscribe();
        self.records_events = None;
    }

    fn poll_auth(&mut self) {
        // NOTE: We must not hold a borrow of `pending_auth` while
        // mutating `self`.
        let completed = match &self.pending_auth {
            Some(pending) => pending.handle.try_recv().map(|o| (o, pending.kind)),
            None => None,
        };
        let Some((outcome, kind)) = completed else {
            return;
        };
        self.pending_auth = None;

        match outcome {
            AuthOutcome::SignedIn(_) => {
                self.set_notice(match kind {
                    AuthKind::Login => "Login successful",
                    _ => "Registration successful",
                });
                self.auth_form.cancel_registration();
                self.enter_patient_management();
            }
            AuthOutcome::SignedOut => {
                self.set_notice("Logged out successfully");
                self.show_login_form();
            }
            AuthOutcome::Failed(reason) => {
                let message = match kind {
                    AuthKind::Login => format!("Authentication failed: {reason}"),
                    AuthKind::Register => format!("Registration failed: {reason}"),
                    AuthKind::Logout => reason,
                };
                self.set_notice(message);
            }
        }
    }

    fn poll_upsert(&mut self) {
        let outcome = match &self.pending_upsert {
            Some(pending) => pending.try_recv(),
            None => None,
        };
        let Some(outcome) = outcome else {
            return;
        };
        self.pending_upsert = None;

        match outcome {
            UpsertOutcome::Saved(record) => {
                tracing::info!(id = %record.id, "Patient record saved");
                self.set_notice("Patient added successfully");
                self.patient_form.clear();
                if !self.records_visible {
                    self.reveal_records();
                }
            }
            UpsertOutcome::Failed(reason) => {
                // Form stays populated so the user can retry.
                self.set_notice(format!("Failed to add patient: {reason}"));
            }
        }
    }

    fn poll_records(&mut self) {
        let mut events = Vec::new();
        if let Some(rx) = &self.records_events {
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }

        for event in events {
            match event {
                RecordsEvent::Snapshot(records) => {
                    self.cache.rebuild(records);
                    if self.records_visible && self.cache.is_empty() {
                        self.set_notice("No patients found");
                    }
                }
                RecordsEvent::StreamError(reason) => {
                    // Last-known contents stay in place: stale but present.
                    self.set_notice(format!("Failed to load patients: {reason}"));
                }
            }
        }
    }
}
