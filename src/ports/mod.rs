//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (identity provider,
//! remote real-time store).

mod identity;
mod remote_store;

pub use identity::IdentityService;
pub use remote_store::{
    RemoteStore, Snapshot, StoreObserver, SubscriptionHandle, PATIENTS_COLLECTION,
};
