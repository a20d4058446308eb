//! In-memory attachment blob store for tests.

use crate::ticket::ports::{FileStore, FileStoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Thread-safe in-memory blob store keyed by generated locators.
#[derive(Debug, Default)]
pub struct InMemoryFileStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryFileStore {
    /// Creates an empty blob store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored bytes for a locator, if present.
    #[must_use]
    pub fn get(&self, locator: &str) -> Option<Vec<u8>> {
        self.locked().get(locator).cloned()
    }

    /// Returns the number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locked().len()
    }

    /// Returns `true` when no blobs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locked().is_empty()
    }

    fn locked(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        match self.blobs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn put(&self, original_name: &str, bytes: &[u8]) -> Result<String, FileStoreError> {
        let locator = format!("{}-{original_name}", Uuid::new_v4());
        self.locked().insert(locator.clone(), bytes.to_vec());
        Ok(locator)
    }

    async fn delete(&self, locator: &str) -> Result<(), FileStoreError> {
        self.locked().remove(locator);
        Ok(())
    }
}
