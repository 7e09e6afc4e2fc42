//! Error types used across `learnhub_notify`.
//!
//! Per-connection faults (malformed frames, failed sends, dropped sockets) are
//! logged and swallowed where they happen and never show up here. These types
//! cover the failures a caller can actually act on.

use thiserror::Error;

/// Failures of the WebSocket server itself, as opposed to a single connection.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A send to one connection's outbound channel failed.
#[derive(Error, Debug)]
#[error("outbound channel closed")]
pub struct DeliveryError;

/// Errors raised by the local credential store.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("stored credential is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Reasons a stored credential cannot be used to announce an identity.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("credential is not a three-segment token")]
    Shape,

    #[error("credential payload is not base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("credential payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("credential payload has an empty admin id")]
    EmptyId,
}

/// Errors that stop the notification agent.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("credential store error: {0}")]
    Store(#[from] PersistenceError),

    #[error("invalid credential: {0}")]
    Credential(#[from] CredentialError),

    #[error("invalid agent url {url}: {reason}")]
    Url { url: String, reason: String },
}

/// Top-level error for the binary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
