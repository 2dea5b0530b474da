//! Port interfaces for routing and intended-destination persistence

use async_trait::async_trait;
use magicbox_domain::{NavigateOptions, Result};

/// Client-side redirect router.
///
/// Called while the resolver holds its teardown gate, so implementations
/// must not block.
pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: &str, options: NavigateOptions);
}

/// Clear-after-read storage for the route the user was headed to
#[async_trait]
pub trait DestinationStore: Send + Sync {
    async fn save(&self, destination: &str) -> Result<()>;

    /// Return the saved destination and clear it
    async fn take(&self) -> Result<Option<String>>;
}
