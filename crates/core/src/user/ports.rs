//! Port interfaces for user profile management
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations for user profile operations.

use async_trait::async_trait;
use magicbox_domain::{NewUserProfile, Result, UserProfile};

/// Trait for user profile persistence and retrieval
#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    /// Get user profile by identity id
    async fn find_by_id(&self, id: &str) -> Result<Option<UserProfile>>;

    /// Create a new user profile.
    ///
    /// A record with the same id already existing must surface as
    /// `MagicBoxError::Conflict`.
    async fn create(&self, profile: NewUserProfile) -> Result<UserProfile>;
}
