//! Blob storage port for attachment payloads.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by file store implementations.
#[derive(Debug, Clone, Error)]
pub enum FileStoreError {
    /// Underlying I/O failure.
    #[error("file store failure: {0}")]
    Io(Arc<dyn std::error::Error + Send + Sync>),
}

impl FileStoreError {
    /// Wraps an I/O error.
    pub fn io(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Io(Arc::new(err))
    }
}

/// Attachment blob storage contract.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Stores raw upload bytes and returns a stable locator usable later
    /// to retrieve or delete the blob.
    async fn put(&self, original_name: &str, bytes: &[u8]) -> Result<String, FileStoreError>;

    /// Deletes a stored blob. Absence is not an error; deletion is
    /// best-effort by contract.
    async fn delete(&self, locator: &str) -> Result<(), FileStoreError>;
}
