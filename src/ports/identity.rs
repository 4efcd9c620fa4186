//! Identity provider port.
//!
//! Abstracts the credential-verifying backend from the session logic.
//! The provider owns credential verification and any session persistence;
//! this core only consumes the resulting identity handle.

use crate::domain::Identity;

/// Trait for the identity provider collaborator.
///
/// Calls may block on network I/O; callers are expected to drive them
/// from a worker thread.
pub trait IdentityService: Send + Sync {
    /// Error type for provider operations. Its display text is surfaced
    /// to the user verbatim; this core does not interpret it.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Verify credentials and open a session.
    ///
    /// # Errors
    /// Returns error on invalid credentials or an unreachable provider.
    fn sign_in(&self, email: &str, password: &str) -> Result<Identity, Self::Error>;

    /// Create an account and open a session.
    ///
    /// # Errors
    /// Returns error when the email is already in use, the password is
    /// rejected by the provider, or the provider is unreachable.
    fn sign_up(&self, email: &str, password: &str) -> Result<Identity, Self::Error>;

    /// Close the current session. Idempotent; succeeds when no session
    /// exists.
    fn sign_out(&self);

    /// The session persisted by the provider, if any.
    ///
    /// Queried once at process start to restore a prior login.
    fn current_session(&self) -> Option<Identity>;
}
