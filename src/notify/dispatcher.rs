//! Notification dispatcher
//!
//! Turns a domain event into one envelope and pushes it to every bound admin
//! connection. Delivery is best effort: a recipient that cannot be reached is
//! evicted from the registry and the remaining recipients are still tried.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::notify::envelope::Envelope;
use crate::notify::event::EventType;
use crate::registry::{self, AdminId, ConnectionRegistry, SharedRegistry};

/// What happened during one dispatch. Diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Admins whose connection accepted the envelope.
    pub delivered: usize,
    /// Admins whose transport was already closed.
    pub skipped: usize,
    /// Admins evicted because the send failed.
    pub evicted: Vec<AdminId>,
}

/// Send the envelope for `event` to every bound, open connection.
///
/// Never panics and never returns an error: failures are logged and confined
/// to the recipient they happened on.
pub fn dispatch(registry: &mut ConnectionRegistry, event: &EventType) -> DispatchReport {
    dispatch_envelope(registry, &Envelope::for_event(event.clone()))
}

pub fn dispatch_envelope(registry: &mut ConnectionRegistry, envelope: &Envelope) -> DispatchReport {
    let mut report = DispatchReport::default();

    if !envelope.event.is_known() {
        warn!(event = %envelope.event, "Unknown event type, using generic message");
    }

    let text = match serde_json::to_string(envelope) {
        Ok(json) => json,
        Err(e) => {
            error!(event = %envelope.event, error = %e, "Failed to serialize envelope");
            return report;
        }
    };
    let frame = WsMessage::text(text);

    let mut failed = Vec::new();
    for (admin_id, connection_id) in registry.snapshot() {
        let Some(connection) = registry.connection(&connection_id) else {
            continue;
        };
        if !connection.is_open() {
            report.skipped += 1;
            continue;
        }
        match connection.deliver(frame.clone()) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!(admin_id = %admin_id, connection_id = %connection_id, error = %e, "Failed to notify admin");
                failed.push((admin_id, connection_id));
            }
        }
    }

    for (admin_id, connection_id) in failed {
        if registry.evict(&admin_id, &connection_id) {
            report.evicted.push(admin_id);
        }
    }

    info!(
        event = %envelope.event,
        delivered = report.delivered,
        skipped = report.skipped,
        evicted = report.evicted.len(),
        "Notification dispatched"
    );
    report
}

/// The handle mutating request handlers hold. Cloning is cheap; every clone
/// talks to the same registry.
#[derive(Debug, Clone)]
pub struct Notifier {
    registry: SharedRegistry,
}

impl Notifier {
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }

    /// Fire-and-forget notification for `event`. Callers must not rely on
    /// whether anyone received it.
    pub fn notify(&self, event: impl Into<EventType>) {
        self.notify_with_report(event);
    }

    /// Same as `notify`, returning the delivery report.
    pub fn notify_with_report(&self, event: impl Into<EventType>) -> DispatchReport {
        let event = event.into();
        let mut registry = registry::lock(&self.registry);
        dispatch(&mut registry, &event)
    }

    /// Notify once per non-empty line of `reader` until it ends. Returns the
    /// number of events dispatched.
    pub async fn notify_lines<R>(&self, reader: R) -> usize
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut dispatched = 0;
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let event = line.trim();
                    if !event.is_empty() {
                        self.notify(event);
                        dispatched += 1;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read event input");
                    break;
                }
            }
        }
        dispatched
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }
}
