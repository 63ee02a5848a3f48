//! Account API payloads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Successful response from the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    /// Raw expiry as sent by the server. Not used for session validity.
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub email: String,
}

impl AuthResponse {
    /// Parse the expiry, accepting either an RFC 3339 timestamp or a bare
    /// `YYYY-MM-DD` date (taken as midnight UTC).
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.expiry.as_deref()?.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

/// Successful response from the registration endpoint. Only the token is
/// contractually present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub token: String,
}

/// Response to `POST /key`. The key is only ever shown once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedApiKey {
    pub key: String,
}
