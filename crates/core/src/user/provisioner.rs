//! Profile provisioning service - core business logic

use std::sync::Arc;

use magicbox_domain::{Identity, MagicBoxError, NewUserProfile, UserProfile};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::ports::UserProfileRepository;

/// Failure to guarantee a profile exists for an identity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionError {
    #[error("profile lookup failed for {user_id}: {source}")]
    Lookup {
        user_id: String,
        #[source]
        source: MagicBoxError,
    },

    #[error("profile creation failed for {user_id}: {source}")]
    Create {
        user_id: String,
        #[source]
        source: MagicBoxError,
    },

    #[error("profile re-verification failed for {user_id}: {source}")]
    Verify {
        user_id: String,
        #[source]
        source: MagicBoxError,
    },

    #[error("profile for {user_id} reported as existing but could not be found")]
    MissingAfterConflict { user_id: String },
}

impl ProvisionError {
    /// User the failed provisioning was for
    pub fn user_id(&self) -> &str {
        match self {
            Self::Lookup { user_id, .. }
            | Self::Create { user_id, .. }
            | Self::Verify { user_id, .. }
            | Self::MissingAfterConflict { user_id } => user_id,
        }
    }
}

impl From<ProvisionError> for MagicBoxError {
    fn from(err: ProvisionError) -> Self {
        match err {
            ProvisionError::Lookup { source, .. }
            | ProvisionError::Create { source, .. }
            | ProvisionError::Verify { source, .. } => source,
            missing @ ProvisionError::MissingAfterConflict { .. } => {
                Self::Internal(missing.to_string())
            }
        }
    }
}

/// Result of a successful `ensure_profile` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The profile was already there (including when a concurrent caller won
    /// the create race)
    Existing(UserProfile),
    /// This call created the profile
    Created(UserProfile),
}

impl ProvisionOutcome {
    /// Profile that now exists
    pub fn profile(&self) -> &UserProfile {
        match self {
            Self::Existing(profile) | Self::Created(profile) => profile,
        }
    }

    /// Take the profile.
    pub fn into_profile(self) -> UserProfile {
        match self {
            Self::Existing(profile) | Self::Created(profile) => profile,
        }
    }

    /// Whether this call inserted the profile
    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Ensures exactly one profile exists per identity
#[derive(Clone)]
pub struct ProfileProvisioner {
    repository: Arc<dyn UserProfileRepository>,
}

impl ProfileProvisioner {
    /// Provisioner over `repository`
    pub fn new(repository: Arc<dyn UserProfileRepository>) -> Self {
        Self { repository }
    }

    /// Look up the identity's profile and create it if absent.
    ///
    /// A create rejected as a duplicate means another caller got there
    /// first; the record is re-read and reported as existing.
    ///
    /// # Errors
    /// Returns [`ProvisionError`] when the lookup or create fails for any
    /// other reason, or when the record is still missing after a conflict.
    #[instrument(skip(self, identity), fields(user_id = %identity.id))]
    pub async fn ensure_profile(
        &self,
        identity: &Identity,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        let user_id = identity.id.clone();

        let existing = self
            .repository
            .find_by_id(&user_id)
            .await
            .map_err(|source| ProvisionError::Lookup { user_id: user_id.clone(), source })?;
        if let Some(profile) = existing {
            debug!("profile already exists");
            return Ok(ProvisionOutcome::Existing(profile));
        }

        let draft = NewUserProfile::from_identity(identity);
        match self.repository.create(draft).await {
            Ok(profile) => {
                info!(name = %profile.name, "created user profile");
                Ok(ProvisionOutcome::Created(profile))
            }
            Err(err) if err.is_conflict() => {
                debug!("profile created concurrently, re-verifying");
                self.verify_after_conflict(user_id).await
            }
            Err(source) => {
                warn!(error = %source, "profile creation failed");
                Err(ProvisionError::Create { user_id, source })
            }
        }
    }

    async fn verify_after_conflict(
        &self,
        user_id: String,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        match self.repository.find_by_id(&user_id).await {
            Ok(Some(profile)) => Ok(ProvisionOutcome::Existing(profile)),
            Ok(None) => Err(ProvisionError::MissingAfterConflict { user_id }),
            Err(source) => Err(ProvisionError::Verify { user_id, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;
    use magicbox_domain::Result as DomainResult;
    use parking_lot::Mutex;

    use super::*;

    /// Repository that always reports a conflict on create and serves
    /// lookups from a scripted queue.
    struct ConflictingRepository {
        lookups: Mutex<Vec<DomainResult<Option<UserProfile>>>>,
    }

    #[async_trait]
    impl UserProfileRepository for ConflictingRepository {
        async fn find_by_id(&self, _id: &str) -> DomainResult<Option<UserProfile>> {
            let mut lookups = self.lookups.lock();
            if lookups.is_empty() {
                Ok(None)
            } else {
                lookups.remove(0)
            }
        }

        async fn create(&self, _profile: NewUserProfile) -> DomainResult<UserProfile> {
            Err(MagicBoxError::Conflict("duplicate key value".into()))
        }
    }

    fn identity() -> Identity {
        Identity::new("user-1", Some("ada@example.com".into()))
    }

    fn stored() -> UserProfile {
        NewUserProfile::from_identity(&identity()).into_profile(Utc::now())
    }

    #[tokio::test]
    async fn conflict_then_found_is_success() {
        let repository =
            ConflictingRepository { lookups: Mutex::new(vec![Ok(None), Ok(Some(stored()))]) };
        let provisioner = ProfileProvisioner::new(Arc::new(repository));

        let outcome = provisioner.ensure_profile(&identity()).await.unwrap();
        assert!(!outcome.was_created());
        assert_eq!(outcome.profile().id, "user-1");
    }

    #[tokio::test]
    async fn conflict_then_missing_is_error() {
        let repository = ConflictingRepository { lookups: Mutex::new(vec![Ok(None), Ok(None)]) };
        let provisioner = ProfileProvisioner::new(Arc::new(repository));

        let err = provisioner.ensure_profile(&identity()).await.unwrap_err();
        assert_eq!(err, ProvisionError::MissingAfterConflict { user_id: "user-1".into() });
    }

    #[tokio::test]
    async fn lookup_failure_is_error() {
        let repository = ConflictingRepository {
            lookups: Mutex::new(vec![Err(MagicBoxError::Network("connection reset".into()))]),
        };
        let provisioner = ProfileProvisioner::new(Arc::new(repository));

        let err = provisioner.ensure_profile(&identity()).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Lookup { .. }));
        assert_eq!(err.user_id(), "user-1");
        assert_eq!(MagicBoxError::from(err), MagicBoxError::Network("connection reset".into()));
    }
}
