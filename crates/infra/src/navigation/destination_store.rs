//! Intended-destination persistence
//!
//! The file store plays the role of browser local storage: one small file
//! holding the route, removed when read.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use magicbox_core::navigation::DestinationStore;
use magicbox_domain::Result;
use parking_lot::Mutex;
use tracing::debug;

use crate::errors::InfraError;

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemoryDestinationStore {
    slot: Mutex<Option<String>>,
}

impl InMemoryDestinationStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DestinationStore for InMemoryDestinationStore {
    async fn save(&self, destination: &str) -> Result<()> {
        *self.slot.lock() = Some(destination.to_string());
        Ok(())
    }

    async fn take(&self) -> Result<Option<String>> {
        Ok(self.slot.lock().take())
    }
}

/// Store backed by a single file
#[derive(Debug, Clone)]
pub struct FileDestinationStore {
    path: PathBuf,
}

impl FileDestinationStore {
    /// Store backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DestinationStore for FileDestinationStore {
    async fn save(&self, destination: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(InfraError::from)?;
        }
        tokio::fs::write(&self.path, destination).await.map_err(InfraError::from)?;
        debug!(path = %self.path.display(), "saved intended destination");
        Ok(())
    }

    async fn take(&self) -> Result<Option<String>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(InfraError::from(err).into()),
        };

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(InfraError::from(err).into()),
        }

        let destination = contents.trim();
        Ok((!destination.is_empty()).then(|| destination.to_string()))
    }
}
