//! User profile types
//!
//! User profile stored in the hosted backend's `users` table, created from
//! the authenticated identity on first sign-in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::Identity;
use crate::constants::FALLBACK_DISPLAY_NAME;

/// Role assigned to a profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    ToolOwner,
    Admin,
}

/// User profile keyed by the identity's opaque id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a profile that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUserProfile {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl NewUserProfile {
    /// Build the insert payload for an identity.
    ///
    /// Display name precedence: full-name hint, short-name hint, email local
    /// part, then [`FALLBACK_DISPLAY_NAME`].
    pub fn from_identity(identity: &Identity) -> Self {
        let name = identity
            .hints
            .full_name
            .as_deref()
            .or(identity.hints.name.as_deref())
            .or_else(|| identity.email_local_part())
            .unwrap_or(FALLBACK_DISPLAY_NAME)
            .to_string();

        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            name,
            avatar_url: identity.hints.avatar_url.clone(),
        }
    }

    /// Materialise the stored record with default role and timestamps.
    pub fn into_profile(self, now: DateTime<Utc>) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email,
            name: self.name,
            avatar_url: self.avatar_url,
            role: UserRole::default(),
            created_at: now,
            updated_at: now,
        }
    }
}
