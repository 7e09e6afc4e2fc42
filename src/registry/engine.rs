//! Connection registry
//!
//! Tracks every open connection and, for each admin identity, the single live
//! connection that notifications for that admin go to.
//!
//! Usage notes:
//! - The API is synchronous and meant to sit behind one lock
//!   (`SharedRegistry`). Every handler runs to completion while holding it, which
//!   gives the same guarantees as a single-threaded event loop: no handler sees
//!   another one half-way through.
//! - Never hold the lock across an `.await`. Outbound sends only enqueue onto the
//!   per-connection channel, so dispatch does not block either.
//! - A newer bind for the same admin replaces the older one. The stale socket is
//!   left alone; it is simply no longer reachable through `admins`.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::registry::connection::{AdminId, Connection, ConnectionId};
use crate::transport::message::ClientMessage;

/// How a second `admin_login` on an already bound connection is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindPolicy {
    /// Later announcements re-bind the connection to the new identity.
    #[default]
    Rebind,
    /// A connection binds once; later announcements are ignored.
    Once,
}

/// Result of feeding one inbound frame to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// The connection is now the live connection for `admin_id`.
    /// `replaced` is the connection that held the entry before, if any.
    Bound {
        admin_id: AdminId,
        replaced: Option<ConnectionId>,
    },
    /// The connection moved from `previous` to `admin_id`.
    Rebound {
        previous: AdminId,
        admin_id: AdminId,
        replaced: Option<ConnectionId>,
    },
    /// Same identity announced again while already registered.
    Unchanged,
    /// `BindPolicy::Once` rejected a second identity.
    Refused { current: AdminId },
    /// Not an identity announcement, or a malformed one.
    Ignored,
    /// The connection id is not registered.
    UnknownConnection,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    pub(crate) connections: HashMap<ConnectionId, Connection>,
    pub(crate) admins: HashMap<AdminId, ConnectionId>,
    policy: BindPolicy,
}

impl ConnectionRegistry {
    pub fn new(policy: BindPolicy) -> Self {
        Self {
            connections: HashMap::new(),
            admins: HashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> BindPolicy {
        self.policy
    }

    /// Register a freshly handshaken connection. It starts unbound and is not
    /// reachable by dispatch until it announces an identity.
    pub fn on_connect(&mut self, connection: Connection) -> ConnectionId {
        let id = connection.id.clone();
        debug_assert!(!connection.is_bound());
        self.connections.insert(id.clone(), connection);
        debug!(connection_id = %id, connections = self.connections.len(), "Connection registered");
        id
    }

    /// Interpret one inbound text frame from `id`.
    ///
    /// Only `{"type":"admin_login","adminId":...}` is acted on. Anything else is
    /// logged and dropped; the connection stays usable either way.
    pub fn on_message(&mut self, id: &ConnectionId, raw: &str) -> BindOutcome {
        match ClientMessage::parse(raw) {
            Ok(ClientMessage::AdminLogin {
                admin_id: Some(admin_id),
            }) => self.bind(id, admin_id),
            Ok(ClientMessage::AdminLogin { admin_id: None }) => {
                warn!(connection_id = %id, "admin_login without adminId ignored");
                BindOutcome::Ignored
            }
            Ok(ClientMessage::Other) => {
                debug!(connection_id = %id, "Ignoring non-login message");
                BindOutcome::Ignored
            }
            Err(err) => {
                warn!(
                    connection_id = %id,
                    error = %err,
                    payload = %raw.chars().take(100).collect::<String>(),
                    "Malformed client message"
                );
                BindOutcome::Ignored
            }
        }
    }

    /// Bind `id` to `admin_id`, replacing whatever connection held that identity.
    pub fn bind(&mut self, id: &ConnectionId, admin_id: AdminId) -> BindOutcome {
        let Some(connection) = self.connections.get_mut(id) else {
            warn!(connection_id = %id, "Bind for unknown connection");
            return BindOutcome::UnknownConnection;
        };

        let current = connection.admin_id().cloned();
        match &current {
            Some(current) if *current == admin_id => {
                if self.admins.get(&admin_id) == Some(id) {
                    return BindOutcome::Unchanged;
                }
            }
            Some(current) if self.policy == BindPolicy::Once => {
                warn!(
                    connection_id = %id,
                    current = %current,
                    requested = %admin_id,
                    "Connection already bound, ignoring new identity"
                );
                return BindOutcome::Refused {
                    current: current.clone(),
                };
            }
            _ => {}
        }

        connection.bind(admin_id.clone());

        // a connection is reachable under one identity only
        if let Some(previous) = &current {
            if *previous != admin_id {
                self.release(previous, id);
            }
        }

        let replaced = self
            .admins
            .insert(admin_id.clone(), id.clone())
            .filter(|old| old != id);

        if let Some(old) = &replaced {
            info!(admin_id = %admin_id, connection_id = %id, replaced = %old, "Admin re-registered, older connection replaced");
        } else {
            info!(admin_id = %admin_id, connection_id = %id, "Admin registered");
        }

        match current {
            Some(previous) if previous != admin_id => BindOutcome::Rebound {
                previous,
                admin_id,
                replaced,
            },
            _ => BindOutcome::Bound { admin_id, replaced },
        }
    }

    /// Forget a closed connection. Its admin entry is removed only while it still
    /// points at this connection, so a faster reconnect is never unregistered by
    /// the old socket's late close.
    pub fn on_close(&mut self, id: &ConnectionId) -> Option<AdminId> {
        let connection = self.connections.remove(id)?;
        let admin_id = connection.admin_id()?.clone();

        if self.release(&admin_id, id) {
            info!(admin_id = %admin_id, connection_id = %id, "Admin unregistered");
            Some(admin_id)
        } else {
            debug!(admin_id = %admin_id, connection_id = %id, "Admin entry no longer points at this connection");
            None
        }
    }

    /// Same cleanup as `on_close`, with the transport error logged.
    pub fn on_error(&mut self, id: &ConnectionId, error: &dyn fmt::Display) -> Option<AdminId> {
        warn!(connection_id = %id, error = %error, "Connection error");
        self.on_close(id)
    }

    /// Drop `admin_id`'s entry after a failed delivery to `id`.
    pub fn evict(&mut self, admin_id: &AdminId, id: &ConnectionId) -> bool {
        let evicted = self.release(admin_id, id);
        if evicted {
            warn!(admin_id = %admin_id, connection_id = %id, "Evicted admin after failed delivery");
        }
        evicted
    }

    fn release(&mut self, admin_id: &AdminId, id: &ConnectionId) -> bool {
        if self.admins.get(admin_id) == Some(id) {
            self.admins.remove(admin_id);
            true
        } else {
            false
        }
    }

    /// Copy of the current admin entries, safe to iterate while the registry changes.
    pub fn snapshot(&self) -> Vec<(AdminId, ConnectionId)> {
        self.admins
            .iter()
            .map(|(admin, id)| (admin.clone(), id.clone()))
            .collect()
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    /// The live connection for `admin_id`, if any.
    pub fn bound_connection(&self, admin_id: &AdminId) -> Option<&Connection> {
        self.admins
            .get(admin_id)
            .and_then(|id| self.connections.get(id))
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn bound_count(&self) -> usize {
        self.admins.len()
    }
}
