//! Session and session-lifecycle event types

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::identity::Identity;

/// Backend-issued proof of authentication
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub identity: Identity,
}

impl Session {
    /// Session with no refresh token or expiry
    pub fn new(access_token: impl Into<String>, identity: Identity) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: "bearer".to_string(),
            expires_at: None,
            identity,
        }
    }

    /// Attach a refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Set the access token expiry.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Check if the access token is expired or expires within the threshold.
    ///
    /// A session without an expiry is never considered expired.
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Utc::now() + Duration::seconds(threshold_seconds) >= expires_at)
    }

    /// Id of the signed-in user
    pub fn user_id(&self) -> &str {
        &self.identity.id
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("identity", &self.identity)
            .finish()
    }
}

/// Session-lifecycle event emitted by the auth subsystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
    TokenRefreshed(Option<Session>),
}

impl SessionEvent {
    /// Session attached to the event, if any.
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(session) => Some(session),
            Self::TokenRefreshed(session) => session.as_ref(),
            Self::SignedOut => None,
        }
    }

    /// Event name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "signed_in",
            Self::SignedOut => "signed_out",
            Self::TokenRefreshed(_) => "token_refreshed",
        }
    }
}
