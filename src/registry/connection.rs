//! Connection representation
//!
//! A `Connection` is one open WebSocket as seen by the registry: a unique id,
//! the admin identity it has announced (if any) and the outbound half used to
//! push frames to it.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::utils::error::DeliveryError;

pub type ConnectionId = String;

/// Identity of a logged-in administrator.
///
/// Tokens issued by the site carry the numeric database id, while older pages
/// send it as a string, so both forms are accepted and normalised to text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AdminId(String);

impl AdminId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdminId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AdminId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<i64> for AdminId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for AdminId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Ok(AdminId(text)),
            RawId::Number(n) => Ok(AdminId::from(n)),
        }
    }
}

/// The sending side of a connection.
///
/// The server uses the per-connection mpsc channel drained by the writer task;
/// anything else (tests, alternative transports) can plug in here.
pub trait Outbound: Send + Sync + fmt::Debug {
    /// Whether the transport still accepts frames.
    fn is_open(&self) -> bool;

    /// Queue a frame without blocking.
    fn deliver(&self, frame: WsMessage) -> Result<(), DeliveryError>;
}

impl Outbound for UnboundedSender<WsMessage> {
    fn is_open(&self) -> bool {
        !self.is_closed()
    }

    fn deliver(&self, frame: WsMessage) -> Result<(), DeliveryError> {
        self.send(frame).map_err(|_| DeliveryError)
    }
}

#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    admin_id: Option<AdminId>,
    outbound: Box<dyn Outbound>,
}

impl Connection {
    /// Create an unbound connection with a fresh id.
    pub fn new(outbound: impl Outbound + 'static) -> Self {
        Self {
            id: format!("conn-{}", Uuid::new_v4()),
            admin_id: None,
            outbound: Box::new(outbound),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.admin_id.is_some()
    }

    pub fn admin_id(&self) -> Option<&AdminId> {
        self.admin_id.as_ref()
    }

    pub(crate) fn bind(&mut self, admin_id: AdminId) -> Option<AdminId> {
        self.admin_id.replace(admin_id)
    }

    pub fn is_open(&self) -> bool {
        self.outbound.is_open()
    }

    pub fn deliver(&self, frame: WsMessage) -> Result<(), DeliveryError> {
        self.outbound.deliver(frame)
    }
}
