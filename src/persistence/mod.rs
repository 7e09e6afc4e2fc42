//! The `persistence` module is the agent's local storage: the place the admin
//! credential lives between runs, like a browser's local storage.
//!
//! It uses `sled` as an embedded key-value store; an in-memory store covers
//! embedding and tests.

pub mod memory;
pub mod sled_store;

pub use memory::MemoryCredentialStore;
pub use sled_store::SledCredentialStore;

use crate::utils::error::PersistenceError;

/// Key the admin credential is stored under.
pub const CREDENTIAL_KEY: &str = "adminToken";

/// Storage for the single admin credential an agent runs as.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, PersistenceError>;

    fn store(&self, token: &str) -> Result<(), PersistenceError>;

    fn clear(&self) -> Result<(), PersistenceError>;
}
