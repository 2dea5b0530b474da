//! Authenticated identity types
//!
//! The auth provider hands back loosely-shaped user metadata whose fields
//! depend on the federated provider. It is parsed once here into an explicit
//! optional-field record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display hints supplied by the auth provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityHints {
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl IdentityHints {
    /// Extract hints from provider `user_metadata`.
    ///
    /// Blank strings and non-string values count as absent. Google payloads
    /// carry the avatar as `picture` when `avatar_url` is missing.
    pub fn from_metadata(metadata: &Value) -> Self {
        Self {
            full_name: string_field(metadata, "full_name"),
            name: string_field(metadata, "name"),
            avatar_url: string_field(metadata, "avatar_url")
                .or_else(|| string_field(metadata, "picture")),
        }
    }
}

/// Externally-issued authenticated principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque id issued by the auth provider
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub hints: IdentityHints,
}

impl Identity {
    /// Identity without provider hints
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self { id: id.into(), email, hints: IdentityHints::default() }
    }

    /// Attach provider metadata hints.
    pub fn with_hints(mut self, hints: IdentityHints) -> Self {
        self.hints = hints;
        self
    }

    /// Local part of the email address, if there is a non-empty one.
    pub fn email_local_part(&self) -> Option<&str> {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .map(str::trim)
            .filter(|local| !local.is_empty())
    }
}

fn string_field(metadata: &Value, key: &str) -> Option<String> {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
