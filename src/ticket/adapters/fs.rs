//! Directory-backed attachment blob store.
//!
//! Blobs live in a single capability-scoped directory; the issued
//! locator is the content digest joined with a random suffix, so equal
//! payloads never share a file and deleting one attachment cannot
//! orphan another.

use crate::ticket::ports::{FileStore, FileStoreError};
use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Blob store writing attachment payloads into one directory.
#[derive(Debug, Clone)]
pub struct DirFileStore {
    root: Arc<Dir>,
}

impl DirFileStore {
    /// Opens the blob directory at `path`, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::Io`] when the directory cannot be
    /// created or opened.
    pub fn open(path: &Utf8Path) -> Result<Self, FileStoreError> {
        std::fs::create_dir_all(path.as_std_path()).map_err(FileStoreError::io)?;
        let root = Dir::open_ambient_dir(path, ambient_authority()).map_err(FileStoreError::io)?;
        Ok(Self {
            root: Arc::new(root),
        })
    }

    /// Wraps an already opened blob directory.
    #[must_use]
    pub fn from_dir(dir: Dir) -> Self {
        Self {
            root: Arc::new(dir),
        }
    }
}

#[async_trait]
impl FileStore for DirFileStore {
    async fn put(&self, _original_name: &str, bytes: &[u8]) -> Result<String, FileStoreError> {
        let digest = Sha256::digest(bytes);
        let locator = format!("{:x}-{}", digest, Uuid::new_v4());
        let root = Arc::clone(&self.root);
        let payload = bytes.to_vec();
        let written = locator.clone();
        tokio::task::spawn_blocking(move || root.write(&written, &payload))
            .await
            .map_err(FileStoreError::io)?
            .map_err(FileStoreError::io)?;
        Ok(locator)
    }

    async fn delete(&self, locator: &str) -> Result<(), FileStoreError> {
        let root = Arc::clone(&self.root);
        let target = locator.to_owned();
        let outcome = tokio::task::spawn_blocking(move || root.remove_file(&target))
            .await
            .map_err(FileStoreError::io)?;
        match outcome {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(FileStoreError::io(err)),
        }
    }
}
