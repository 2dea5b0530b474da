//! In-memory user profile repository
//!
//! Enforces the unique-id constraint atomically through the map's entry
//! API, so concurrent creates for one id behave like the hosted table.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use magicbox_core::user::ports::UserProfileRepository as UserProfileRepositoryPort;
use magicbox_domain::{MagicBoxError, NewUserProfile, Result as DomainResult, UserProfile};

#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    profiles: DashMap<String, UserProfile>,
}

impl InMemoryProfileRepository {
    /// Empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether no profile is stored
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl UserProfileRepositoryPort for InMemoryProfileRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<UserProfile>> {
        Ok(self.profiles.get(id).map(|profile| profile.clone()))
    }

    async fn create(&self, profile: NewUserProfile) -> DomainResult<UserProfile> {
        match self.profiles.entry(profile.id.clone()) {
            Entry::Occupied(_) => {
                Err(MagicBoxError::Conflict(format!("profile {} already exists", profile.id)))
            }
            Entry::Vacant(slot) => Ok(slot.insert(profile.into_profile(Utc::now())).clone()),
        }
    }
}
