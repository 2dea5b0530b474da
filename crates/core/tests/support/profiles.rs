//! In-memory fake for `UserProfileRepository`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use magicbox_core::user::UserProfileRepository;
use magicbox_domain::{MagicBoxError, NewUserProfile, Result as DomainResult, UserProfile};
use parking_lot::Mutex;

/// Profile store enforcing the unique-id constraint, with call counters and
/// an optional delay between the duplicate check and the insert.
#[derive(Default)]
pub struct FakeProfiles {
    records: DashMap<String, UserProfile>,
    create_delay: Mutex<Option<Duration>>,
    create_error: Mutex<Option<MagicBoxError>>,
    find_calls: AtomicUsize,
    create_calls: AtomicUsize,
}

impl FakeProfiles {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, draft: NewUserProfile) {
        self.records.insert(draft.id.clone(), draft.into_profile(Utc::now()));
    }

    pub fn set_create_delay(&self, delay: Duration) {
        *self.create_delay.lock() = Some(delay);
    }

    pub fn fail_creates_with(&self, error: MagicBoxError) {
        *self.create_error.lock() = Some(error);
    }

    pub fn get(&self, id: &str) -> Option<UserProfile> {
        self.records.get(id).map(|record| record.clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserProfileRepository for FakeProfiles {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<UserProfile>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.get(id))
    }

    async fn create(&self, profile: NewUserProfile) -> DomainResult<UserProfile> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.create_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.create_error.lock().clone() {
            return Err(error);
        }

        match self.records.entry(profile.id.clone()) {
            Entry::Occupied(_) => Err(MagicBoxError::Conflict(format!(
                "duplicate key value violates unique constraint \"users_pkey\" ({})",
                profile.id
            ))),
            Entry::Vacant(slot) => Ok(slot.insert(profile.into_profile(Utc::now())).clone()),
        }
    }
}
