use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notify::event::EventType;

/// The notification pushed to every bound admin connection.
///
/// Built fresh for each dispatch and never stored.
///
/// ```json
/// {"type":"booking","message":"New booking","isBrowserNotification":true,"timestamp":"2026-10-16T09:30:00Z"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(rename = "type")]
    pub event: EventType,
    pub message: String,
    pub is_browser_notification: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Envelope {
    /// Envelope for `event`, stamped with the current time.
    pub fn for_event(event: EventType) -> Self {
        Self::at(event, Utc::now())
    }

    pub fn at(event: EventType, timestamp: DateTime<Utc>) -> Self {
        Self {
            message: event.message().to_string(),
            event,
            is_browser_notification: true,
            timestamp: Some(timestamp),
        }
    }
}
