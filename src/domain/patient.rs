//! Patient record types.
//!
//! The field set below is the persisted-shape contract with the remote
//! store: the serialized names (`name`, `email`, `age`, `id`, `disease`)
//! must round-trip unchanged against data already stored by other
//! front ends.

use serde::{Deserialize, Serialize};

/// A single patient record in the remote collection.
///
/// `id` doubles as the storage key and is supplied by the caller, not
/// generated. Writing a record under an existing `id` overwrites the
/// stored record in place (silent upsert).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub name: String,
    pub email: String,
    /// Free-form age text. Not validated as numeric.
    pub age: String,
    /// Storage key within the collection.
    pub id: String,
    pub disease: String,
}

impl PatientRecord {
    /// Build a record from the five form fields.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        age: impl Into<String>,
        disease: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age: age.into(),
            id: id.into(),
            disease: disease.into(),
        }
    }

    /// Decode one opaque snapshot child.
    ///
    /// Returns `None` when the child is not decodable into the five-field
    /// shape; undecodable children are skipped by the caller rather than
    /// failing the whole snapshot.
    #[must_use]
    pub fn from_child(child: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(child.clone()).ok()
    }
}
