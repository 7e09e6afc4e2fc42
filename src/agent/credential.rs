//! Reading the admin credential without a server round trip.
//!
//! The credential is a compact three-segment token issued by the site's login
//! flow. Only the payload segment is read here; the signature is the server's
//! business.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::persistence::CredentialStore;
use crate::registry::AdminId;
use crate::utils::error::{AgentError, CredentialError};

/// URL-safe alphabet, padding optional.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The claims the agent relies on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CredentialClaims {
    pub id: AdminId,
    /// Expiry, seconds since the Unix epoch. NumericDate allows fractions.
    pub exp: f64,
    #[serde(default)]
    pub username: Option<String>,
}

impl CredentialClaims {
    pub fn decode(token: &str) -> Result<Self, CredentialError> {
        let segments: Vec<&str> = token.trim().split('.').collect();
        let [_, payload, _] = segments.as_slice() else {
            return Err(CredentialError::Shape);
        };

        let bytes = PAYLOAD_ENGINE.decode(payload)?;
        let claims: CredentialClaims = serde_json::from_slice(&bytes)?;
        if claims.id.as_str().is_empty() {
            return Err(CredentialError::EmptyId);
        }
        Ok(claims)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if !self.exp.is_finite() {
            return None;
        }
        DateTime::from_timestamp_millis((self.exp * 1000.0) as i64)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp * 1000.0 <= now.timestamp_millis() as f64
    }
}

/// What the stored credential means for the next connection attempt.
#[derive(Debug)]
pub enum CredentialStatus {
    Valid(CredentialClaims),
    Expired(CredentialClaims),
    Unreadable(CredentialError),
    Missing,
}

impl CredentialStatus {
    pub fn of(token: Option<&str>, now: DateTime<Utc>) -> Self {
        let Some(token) = token else {
            return CredentialStatus::Missing;
        };
        match CredentialClaims::decode(token) {
            Ok(claims) if claims.is_expired_at(now) => CredentialStatus::Expired(claims),
            Ok(claims) => CredentialStatus::Valid(claims),
            Err(e) => CredentialStatus::Unreadable(e),
        }
    }
}

/// Check `token` and put it in `store`. A token that cannot be read is
/// rejected before anything is written.
pub fn save_credential(
    store: &impl CredentialStore,
    token: &str,
) -> Result<CredentialClaims, AgentError> {
    let token = token.trim();
    let claims = CredentialClaims::decode(token)?;
    store.store(token)?;
    Ok(claims)
}
