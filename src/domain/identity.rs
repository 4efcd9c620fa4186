//! Authenticated principal handle.

use serde::{Deserialize, Serialize};

/// Opaque handle for an authenticated staff member.
///
/// Created by a successful sign-in or sign-up, destroyed by sign-out.
/// At most one live identity exists per process; the identity provider
/// owns any persistence of the underlying session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable identifier assigned by the identity provider.
    pub uid: String,
}

impl Identity {
    /// Create an identity from a provider-assigned id.
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_equality_is_by_uid() {
        assert_eq!(Identity::new("u-1"), Identity::new("u-1"));
        assert_ne!(Identity::new("u-1"), Identity::new("u-2"));
    }
}
