//! The `transport` module carries connection events between browsers and the
//! registry over WebSockets.
//!
//! It defines the inbound wire message and implements the server: accepting
//! upgrades at `/`, running one reader and one writer per socket, and reporting
//! connect, message, close and error events to the registry.

pub mod message;
pub mod websocket;

pub use message::ClientMessage;
pub use websocket::{ENDPOINT_PATH, serve, start_websocket_server};
