//! File storage port - where featured images live.

use async_trait::async_trait;
use bytes::Bytes;

/// File storage trait - abstraction over storage backends (local disk, object stores).
///
/// Paths handed out by [`FileStorage::put`] are relative to the storage root and
/// are what gets persisted on the post.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `contents` under `directory` with a generated file name and the
    /// given extension. Returns the stored path, e.g. `images/posts/featured-images/<name>.png`.
    async fn put(
        &self,
        directory: &str,
        extension: &str,
        contents: Bytes,
    ) -> Result<String, StorageError>;

    /// Delete a stored file. Returns `Ok(false)` when nothing existed at `path`.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;

    /// Public URL for a stored path.
    fn url(&self, path: &str) -> String;
}

/// File storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
