//! Trait definitions for the storage module.

use async_trait::async_trait;
use std::path::Path;

use super::error::StorageError;
use super::types::{ObjectInfo, ObjectMetadata, PushReceipt};

/// Object store access used by the transcoder.
///
/// Implementations are constructed by the host process and injected; they may
/// be shared across concurrent runs since every call is independent per key.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Returns the name of this storage backend.
    fn name(&self) -> &str;

    /// Downloads `bucket/key` to `dest`, returning the number of bytes written.
    async fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, StorageError>;

    /// Uploads the local file `src` to `bucket/key` with the given metadata.
    async fn push(
        &self,
        src: &Path,
        bucket: &str,
        key: &str,
        metadata: &ObjectMetadata,
    ) -> Result<PushReceipt, StorageError>;

    /// Lists objects whose key starts with `prefix`.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError>;

    /// Deletes `bucket/key`. Deleting a missing object is not an error.
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// The URL players use to reach `bucket/key`.
    fn object_url(&self, bucket: &str, key: &str) -> String;

    /// Validates that the backend is properly configured and reachable.
    async fn validate(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
