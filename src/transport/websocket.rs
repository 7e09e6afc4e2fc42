//! WebSocket transport
//!
//! Accepts upgrade requests on `/`, registers each socket with the registry and
//! feeds it the socket's lifecycle:
//! - handshake → `on_connect` (unbound)
//! - text frame → `on_message` (identity announcement)
//! - close / end of stream → `on_close`
//! - read or write error → `on_error`
//!
//! Every socket gets an unbounded channel. The sending half is what the registry
//! stores and what dispatch writes to; a writer task drains the receiving half
//! into the socket, so no send ever waits on the network.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tracing::{debug, info, warn};
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::StatusCode;
use tungstenite::protocol::CloseFrame;
use tungstenite::protocol::Message as WsMessage;
use tungstenite::protocol::frame::coding::CloseCode;

use crate::config::ServerSettings;
use crate::registry::{self, Connection, ConnectionId, SharedRegistry};
use crate::utils::error::TransportError;

/// The one upgrade endpoint shared by every page.
pub const ENDPOINT_PATH: &str = "/";

/// Bind `host:port` and serve until the task is dropped.
pub async fn start_websocket_server(
    settings: &ServerSettings,
    registry: SharedRegistry,
) -> Result<(), TransportError> {
    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| TransportError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!("WebSocket server listening on ws://{addr}{ENDPOINT_PATH}");
    serve(listener, registry, settings.max_connections).await;
    Ok(())
}

/// Accept loop over an already bound listener.
pub async fn serve(listener: TcpListener, registry: SharedRegistry, max_connections: usize) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                spawn(handle_connection(stream, peer, registry.clone(), max_connections));
            }
            Err(e) => {
                warn!(error = %e, "Failed to accept TCP connection");
            }
        }
    }
}

/// Reject upgrades for any path other than `ENDPOINT_PATH`.
pub fn root_path_only(request: &Request, response: Response) -> Result<Response, ErrorResponse> {
    let path = request.uri().path();
    if path == ENDPOINT_PATH {
        Ok(response)
    } else {
        let mut rejection = ErrorResponse::new(Some(format!("no WebSocket endpoint at {path}")));
        *rejection.status_mut() = StatusCode::NOT_FOUND;
        Err(rejection)
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    registry: SharedRegistry,
    max_connections: usize,
) {
    let ws_stream = match accept_hdr_async(stream, root_path_only).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(peer = %peer, error = %e, "WebSocket handshake error");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

    let connection_id = {
        let mut registry = registry::lock(&registry);
        if registry.connection_count() >= max_connections {
            None
        } else {
            Some(registry.on_connect(Connection::new(tx)))
        }
    };
    let Some(connection_id) = connection_id else {
        warn!(peer = %peer, max_connections, "Connection limit reached, closing");
        let frame = CloseFrame {
            code: CloseCode::Again,
            reason: "server at capacity".into(),
        };
        let _ = ws_sender.send(WsMessage::Close(Some(frame))).await;
        return;
    };

    info!(peer = %peer, connection_id = %connection_id, "WebSocket client connected");

    let cleanup = Cleanup::new(registry.clone(), connection_id.clone());

    {
        let cleanup = cleanup.clone();
        let connection_id = connection_id.clone();

        spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(e) = ws_sender.send(msg).await {
                    cleanup.error(&e);
                    break;
                }
            }
            // flush a pending close handshake, if any
            let _ = ws_sender.close().await;
            debug!(connection_id = %connection_id, "Send loop closed");
        });
    }

    loop {
        match ws_receiver.next().await {
            Some(Ok(WsMessage::Text(text))) => {
                let mut registry = registry::lock(&registry);
                registry.on_message(&connection_id, text.as_str());
            }
            Some(Ok(WsMessage::Close(frame))) => {
                info!(connection_id = %connection_id, reason = ?frame, "Client initiated close");
                cleanup.close();
                break;
            }
            Some(Ok(WsMessage::Binary(data))) => {
                debug!(connection_id = %connection_id, bytes = data.len(), "Ignoring binary frame");
            }
            // ping/pong are answered by tungstenite
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                cleanup.error(&e);
                break;
            }
            None => {
                cleanup.close();
                break;
            }
        }
    }

    info!(peer = %peer, connection_id = %connection_id, "WebSocket client disconnected");
}

/// Runs the registry cleanup for one connection exactly once, whichever of the
/// reader or writer notices the end first.
#[derive(Clone)]
struct Cleanup {
    registry: SharedRegistry,
    connection_id: ConnectionId,
    done: Arc<AtomicBool>,
}

impl Cleanup {
    fn new(registry: SharedRegistry, connection_id: ConnectionId) -> Self {
        Self {
            registry,
            connection_id,
            done: Arc::new(AtomicBool::new(false)),
        }
    }

    fn close(&self) {
        if !self.done.swap(true, Ordering::SeqCst) {
            registry::lock(&self.registry).on_close(&self.connection_id);
        }
    }

    fn error(&self, error: &dyn fmt::Display) {
        if !self.done.swap(true, Ordering::SeqCst) {
            registry::lock(&self.registry).on_error(&self.connection_id, error);
        }
    }
}
