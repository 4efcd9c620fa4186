//! Session store: Authentication state for the current process.
//!
//! Holds the single live identity and delegates credential handling to
//! the identity provider port. Provider error text is passed through to
//! the caller without interpretation.

use std::sync::{Arc, Mutex};

use crate::domain::Identity;
use crate::ports::IdentityService;
use crate::{Result, WardlinkError};

/// Minimum password length accepted for registration.
///
/// Enforced locally so a too-short password never costs a provider
/// round-trip.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Process-wide authentication state.
///
/// At most one identity is live at a time. The identity slot is written
/// only by the terminal completions of sign-in, sign-up and sign-out.
pub struct SessionStore<I>
where
    I: IdentityService,
{
    identity_service: Arc<I>,
    current: Mutex<Option<Identity>>,
}

impl<I> SessionStore<I>
where
    I: IdentityService,
{
    /// Create the store, restoring any session the provider persisted.
    #[must_use]
    pub fn new(identity_service: Arc<I>) -> Self {
        let restored = identity_service.current_session();
        if let Some(identity) = &restored {
            tracing::info!(uid = %identity.uid, "Restored persisted session");
        }
        Self {
            identity_service,
            current: Mutex::new(restored),
        }
    }

    /// Verify credentials against the provider and open a session.
    ///
    /// # Errors
    /// Returns `Auth` carrying the provider's reason text.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = self
            .identity_service
            .sign_in(email, password)
            .map_err(|e| WardlinkError::Auth(e.to_string()))?;

        tracing::info!(uid = %identity.uid, "Sign-in succeeded");
        *self.current.lock().expect("Lock failed") = Some(identity.clone());
        Ok(identity)
    }

    /// Create an account with the provider and open a session.
    ///
    /// Passwords shorter than [`MIN_PASSWORD_LEN`] are rejected locally,
    /// with no provider call.
    ///
    /// # Errors
    /// Returns `Validation` for a too-short password, otherwise `Auth`
    /// carrying the provider's reason text.
    pub fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(WardlinkError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let identity = self
            .identity_service
            .sign_up(email, password)
            .map_err(|e| WardlinkError::Auth(e.to_string()))?;

        tracing::info!(uid = %identity.uid, "Registration succeeded");
        *self.current.lock().expect("Lock failed") = Some(identity.clone());
        Ok(identity)
    }

    /// Close the session. Idempotent; always succeeds locally, even when
    /// no session exists.
    pub fn sign_out(&self) {
        self.identity_service.sign_out();
        let previous = self.current.lock().expect("Lock failed").take();
        if previous.is_some() {
            tracing::info!("Signed out");
        }
    }

    /// The live identity, if any.
    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.current.lock().expect("Lock failed").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct MockAuthError(String);

    /// Identity provider double that counts calls and accepts one
    /// configured credential pair.
    struct MockIdentityService {
        accepted: Mutex<Option<(String, String)>>,
        persisted: Option<Identity>,
        sign_in_calls: AtomicUsize,
        sign_up_calls: AtomicUsize,
    }

    impl MockIdentityService {
        fn new() -> Self {
            Self {
                accepted: Mutex::new(None),
                persisted: None,
                sign_in_calls: AtomicUsize::new(0),
                sign_up_calls: AtomicUsize::new(0),
            }
        }

        fn with_persisted_session(identity: Identity) -> Self {
            Self {
                persisted: Some(identity),
                ..Self::new()
            }
        }
    }

    impl IdentityService for MockIdentityService {
        type Error = MockAuthError;

        fn sign_in(
            &self,
            email: &str,
            password: &str,
        ) -> std::result::Result<Identity, Self::Error> {
            self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
            let accepted = self.accepted.lock().expect("Lock failed");
            match accepted.as_ref() {
                Some((e, p)) if e == email && p == password => Ok(Identity::new("mock-uid")),
                _ => Err(MockAuthError("The password is invalid".to_string())),
            }
        }

        fn sign_up(
            &self,
            email: &str,
            password: &str,
        ) -> std::result::Result<Identity, Self::Error> {
            self.sign_up_calls.fetch_add(1, Ordering::SeqCst);
            *self.accepted.lock().expect("Lock failed") =
                Some((email.to_string(), password.to_string()));
            Ok(Identity::new("mock-uid"))
        }

        fn sign_out(&self) {}

        fn current_session(&self) -> Option<Identity> {
            self.persisted.clone()
        }
    }

    #[test]
    fn test_sign_up_then_sign_in_with_same_pair() {
        let provider = Arc::new(MockIdentityService::new());
        let store = SessionStore::new(provider.clone());

        store
            .sign_up("a@b.com", "secret1")
            .expect("Registration should succeed");
        store.sign_out();
        assert!(store.current_identity().is_none());

        let identity = store
            .sign_in("a@b.com", "secret1")
            .expect("Sign-in should succeed");
        assert_eq!(identity.uid, "mock-uid");
        assert_eq!(store.current_identity(), Some(identity));
    }

    #[test]
    fn test_short_password_never_reaches_provider() {
        let provider = Arc::new(MockIdentityService::new());
        let store = SessionStore::new(provider.clone());

        let err = store.sign_up("a@b.com", "abc").expect_err("Should reject");
        assert!(matches!(err, WardlinkError::Validation(_)));
        assert_eq!(provider.sign_up_calls.load(Ordering::SeqCst), 0);
        assert!(store.current_identity().is_none());
    }

    #[test]
    fn test_sign_in_failure_passes_provider_reason_through() {
        let provider = Arc::new(MockIdentityService::new());
        let store = SessionStore::new(provider.clone());

        let err = store
            .sign_in("a@b.com", "wrong-pass")
            .expect_err("Should fail");
        match err {
            WardlinkError::Auth(reason) => assert_eq!(reason, "The password is invalid"),
            other => panic!("Expected Auth error, got {other:?}"),
        }
        assert!(store.current_identity().is_none());
    }

    #[test]
    fn test_sign_out_is_idempotent() {
        let provider = Arc::new(MockIdentityService::new());
        let store = SessionStore::new(provider);

        store.sign_out();
        store.sign_out();
        assert!(store.current_identity().is_none());
    }

    #[test]
    fn test_persisted_session_restored_at_construction() {
        let provider = Arc::new(MockIdentityService::with_persisted_session(Identity::new(
            "restored-uid",
        )));
        let store = SessionStore::new(provider);

        assert_eq!(
            store.current_identity(),
            Some(Identity::new("restored-uid"))
        );
    }
}
