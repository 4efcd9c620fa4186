//! Adapters layer: Concrete implementations of the ports.

pub mod memory;
pub mod sanitize;
pub mod sqlite;

pub use memory::{InMemoryRemoteStore, MemoryStoreError};
pub use sanitize::SanitizingMakeWriter;
pub use sqlite::{IdentityError, SqliteIdentityService};
