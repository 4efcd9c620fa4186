//! # Wardlink
//!
//! Core library for a hospital staff front end: authentication/session
//! management plus real-time synchronization of patient records from a
//! remote keyed collection.
//!
//! This crate provides:
//! - A session store and login/register form state machine
//! - A record client mirroring the remote collection into an ordered
//!   local cache under concurrent remote writes
//! - A pure projection from session/form state to visible UI elements
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (PatientRecord, Identity, Credentials)
//! - `ports`: Trait definitions for external collaborators
//! - `adapters`: Concrete implementations (SQLite identity provider,
//!   in-memory remote store, log sanitizer)
//! - `application`: Use cases orchestrating domain and ports
//! - `ui`: Presentation-independent UI state machine and orchestrator

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;
pub mod ui;

pub use domain::{Identity, PatientRecord};

/// Result type for Wardlink operations
pub type Result<T> = std::result::Result<T, WardlinkError>;

/// Main error type for Wardlink
#[derive(Debug, thiserror::Error)]
pub enum WardlinkError {
    /// Locally detected input problem. Never reaches a collaborator.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The identity provider rejected the credentials or was unreachable.
    /// The message is the collaborator's reason text, passed through as-is.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A record write against the remote store failed.
    #[error("Record write failed: {0}")]
    StoreWrite(String),

    /// The record subscription stream failed (e.g. permission revoked).
    #[error("Record stream failed: {0}")]
    StoreObserve(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
