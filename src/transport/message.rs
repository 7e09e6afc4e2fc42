use serde::Deserialize;
use serde::de::Error as _;
use serde_json::{Value, json};

use crate::registry::AdminId;

/// Frames a browser tab may send. Only the identity announcement carries
/// meaning; every other `type` deserialises to `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "admin_login")]
    AdminLogin {
        #[serde(rename = "adminId", default)]
        admin_id: Option<AdminId>,
    },

    #[serde(other)]
    Other,
}

impl ClientMessage {
    /// Parse a raw frame. Only JSON objects are messages; tagged enums would
    /// otherwise also accept the array form. An empty `adminId` counts as absent.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(raw)?;
        if !value.is_object() {
            return Err(serde_json::Error::custom("client message is not a JSON object"));
        }
        let message = ClientMessage::deserialize(value)?;
        Ok(match message {
            ClientMessage::AdminLogin { admin_id: Some(id) } if id.as_str().is_empty() => {
                ClientMessage::AdminLogin { admin_id: None }
            }
            other => other,
        })
    }

    /// The identity announcement a tab sends right after the socket opens.
    pub fn admin_login_frame(admin_id: &AdminId) -> String {
        json!({ "type": "admin_login", "adminId": admin_id }).to_string()
    }
}
