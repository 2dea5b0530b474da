//! Hosted auth API payloads

use chrono::{DateTime, Duration, TimeZone, Utc};
use magicbox_domain::{Identity, IdentityHints, Session};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User object returned by the auth API
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

impl AuthUser {
    /// Identity with provider metadata mapped to hints
    pub fn into_identity(self) -> Identity {
        let hints = IdentityHints::from_metadata(&self.user_metadata);
        let email = self.email.filter(|email| !email.trim().is_empty());
        Identity::new(self.id, email).with_hints(hints)
    }
}

/// Response of `POST /auth/v1/token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Absolute expiry as a unix timestamp
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl TokenResponse {
    /// Build the session, preferring the absolute expiry when both are sent.
    ///
    /// Expiry values outside the representable range are dropped, leaving
    /// the session without an expiry.
    pub fn into_session(self, received_at: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|timestamp| Utc.timestamp_opt(timestamp, 0).single())
            .or_else(|| {
                self.expires_in
                    .and_then(Duration::try_seconds)
                    .and_then(|lifetime| received_at.checked_add_signed(lifetime))
            });

        let mut session = Session::new(self.access_token, self.user.into_identity());
        session.token_type = self.token_type;
        session.refresh_token = self.refresh_token;
        session.expires_at = expires_at;
        session
    }
}

/// Body of the PKCE code exchange
#[derive(Debug, Serialize)]
pub struct PkceGrant<'a> {
    pub auth_code: &'a str,
    pub code_verifier: &'a str,
}

/// Body of the refresh-token grant
#[derive(Debug, Serialize)]
pub struct RefreshGrant<'a> {
    pub refresh_token: &'a str,
}
