//! Bearer-token source for backend data requests

use async_trait::async_trait;
use magicbox_domain::Result;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with fixed tokens.
/// `None` means no user is signed in and requests go out with the anonymous
/// key only.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<Option<String>>;
}

/// Provider that always returns the same token
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider(Option<String>);

impl StaticTokenProvider {
    /// Provider that always returns `token`
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    /// Provider with no user token
    pub fn anonymous() -> Self {
        Self(None)
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}
