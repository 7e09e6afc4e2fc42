//! The `registry` module knows, at any instant, which connections are open and
//! which single connection is live for each admin identity.

pub mod connection;
pub mod engine;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use connection::{AdminId, Connection, ConnectionId, Outbound};
pub use engine::{BindOutcome, BindPolicy, ConnectionRegistry};

/// The registry as owned by the server's composition root and shared with the
/// accept loop and the notifier.
pub type SharedRegistry = Arc<Mutex<ConnectionRegistry>>;

impl ConnectionRegistry {
    pub fn shared(policy: BindPolicy) -> SharedRegistry {
        Arc::new(Mutex::new(ConnectionRegistry::new(policy)))
    }
}

/// Lock the registry. A handler that panicked mid-update leaves plain map
/// state behind, so the poison flag is ignored rather than propagated.
pub fn lock(registry: &SharedRegistry) -> MutexGuard<'_, ConnectionRegistry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests;
