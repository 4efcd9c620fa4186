//! Transient credential values.
//!
//! Credentials exist only for the duration of the call that consumes
//! them. Password material is wiped from memory on drop.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Email/password pair entered into the login or registration form.
///
/// The confirmation field is only populated during registration.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    #[zeroize(skip)]
    pub email: String,
    pub password: String,
    pub confirm: String,
}

impl std::fmt::Debug for Credentials {
    /// Password material is redacted by type so it cannot leak through
    /// debug formatting into logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("confirm", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Credentials for a sign-in attempt (no confirmation field).
    #[must_use]
    pub fn for_login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirm: String::new(),
        }
    }

    /// Credentials for a registration attempt.
    #[must_use]
    pub fn for_registration(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirm: confirm.into(),
        }
    }

    /// Whether password and confirmation agree.
    #[must_use]
    pub fn passwords_match(&self) -> bool {
        self.password == self.confirm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passwords_match() {
        let creds = Credentials::for_registration("a@b.com", "secret1", "secret1");
        assert!(creds.passwords_match());

        let creds = Credentials::for_registration("a@b.com", "abc123", "xyz999");
        assert!(!creds.passwords_match());
    }
}
