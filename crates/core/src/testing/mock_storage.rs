//! Mock object storage for testing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{ObjectInfo, ObjectMetadata, ObjectStorage, PushReceipt, StorageError};

/// A recorded upload for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPush {
    pub bucket: String,
    pub key: String,
    pub metadata: ObjectMetadata,
    pub size_bytes: u64,
}

/// A stored object.
#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    metadata: Option<ObjectMetadata>,
}

/// A failure to inject on the next matching call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    NotFound,
    AccessDenied,
    Transient,
}

impl InjectedFailure {
    fn into_error(self, operation: &'static str, bucket: &str, key: &str) -> StorageError {
        match self {
            Self::NotFound => StorageError::not_found(bucket, key),
            Self::AccessDenied => StorageError::access_denied(bucket, key),
            Self::Transient => StorageError::transient(operation, bucket, key, "injected failure"),
        }
    }
}

/// In-memory implementation of the ObjectStorage trait.
///
/// # Example
///
/// ```rust,ignore
/// use hlsforge_core::testing::{InjectedFailure, MockStorage};
///
/// let storage = MockStorage::new();
/// storage.insert("media", "lecture.mp4", b"...".to_vec()).await;
/// storage.fail_push_at(3, InjectedFailure::Transient).await;
/// // ... run the orchestrator ...
/// assert_eq!(storage.pushed_keys().await.len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    objects: Arc<RwLock<BTreeMap<(String, String), StoredObject>>>,
    pushes: Arc<RwLock<Vec<RecordedPush>>>,
    fetches: Arc<RwLock<Vec<String>>>,
    fetch_failure: Arc<RwLock<Option<InjectedFailure>>>,
    /// Fail the push with this zero-based index.
    push_failure: Arc<RwLock<Option<(usize, InjectedFailure)>>>,
}

impl MockStorage {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object directly, bypassing push recording.
    pub async fn insert(&self, bucket: &str, key: &str, data: Vec<u8>) {
        self.objects.write().await.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data,
                metadata: None,
            },
        );
    }

    /// Read an object's bytes.
    pub async fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.data.clone())
    }

    /// Read the metadata an object was pushed with.
    pub async fn metadata(&self, bucket: &str, key: &str) -> Option<ObjectMetadata> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .and_then(|o| o.metadata.clone())
    }

    /// Every key in a bucket, sorted.
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .read()
            .await
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    /// Get all recorded pushes, in order.
    pub async fn recorded_pushes(&self) -> Vec<RecordedPush> {
        self.pushes.read().await.clone()
    }

    /// Keys of successful pushes, in order.
    pub async fn pushed_keys(&self) -> Vec<String> {
        self.pushes
            .read()
            .await
            .iter()
            .map(|p| p.key.clone())
            .collect()
    }

    /// Clear recorded pushes and fetches.
    pub async fn clear_recorded(&self) {
        self.pushes.write().await.clear();
        self.fetches.write().await.clear();
    }

    /// Number of fetch calls made.
    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }

    /// Make the next fetch fail.
    pub async fn fail_next_fetch(&self, failure: InjectedFailure) {
        *self.fetch_failure.write().await = Some(failure);
    }

    /// Make the push with zero-based position `index` fail.
    pub async fn fail_push_at(&self, index: usize, failure: InjectedFailure) {
        *self.push_failure.write().await = Some((index, failure));
    }
}

#[async_trait]
impl ObjectStorage for MockStorage {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, StorageError> {
        self.fetches.write().await.push(key.to_string());

        if let Some(failure) = self.fetch_failure.write().await.take() {
            return Err(failure.into_error("get_object", bucket, key));
        }

        let data = self
            .get(bucket, key)
            .await
            .ok_or_else(|| StorageError::not_found(bucket, key))?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }
        tokio::fs::write(dest, &data)
            .await
            .map_err(|e| StorageError::io(dest, e))?;
        Ok(data.len() as u64)
    }

    async fn push(
        &self,
        src: &Path,
        bucket: &str,
        key: &str,
        metadata: &ObjectMetadata,
    ) -> Result<PushReceipt, StorageError> {
        {
            let mut failure = self.push_failure.write().await;
            if let Some((index, kind)) = *failure {
                if self.pushes.read().await.len() == index {
                    *failure = None;
                    return Err(kind.into_error("put_object", bucket, key));
                }
            }
        }

        let data = tokio::fs::read(src)
            .await
            .map_err(|e| StorageError::io(src, e))?;
        let size_bytes = data.len() as u64;

        self.objects.write().await.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data,
                metadata: Some(metadata.clone()),
            },
        );
        self.pushes.write().await.push(RecordedPush {
            bucket: bucket.to_string(),
            key: key.to_string(),
            metadata: metadata.clone(),
            size_bytes,
        });

        Ok(PushReceipt {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size_bytes,
            etag: None,
        })
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        Ok(self
            .objects
            .read()
            .await
            .iter()
            .filter(|((b, k), _)| b == bucket && k.starts_with(prefix))
            .map(|((_, k), o)| ObjectInfo {
                key: k.clone(),
                size_bytes: o.data.len() as u64,
                last_modified: None,
            })
            .collect())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("mock://{}/{}", bucket, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fetch_and_push() {
        let temp = TempDir::new().unwrap();
        let storage = MockStorage::new();
        storage.insert("media", "in.mp4", b"abc".to_vec()).await;

        let dest = temp.path().join("in.mp4");
        assert_eq!(storage.fetch("media", "in.mp4", &dest).await.unwrap(), 3);

        storage
            .push(&dest, "media", "out.ts", &ObjectMetadata::segment())
            .await
            .unwrap();
        assert_eq!(storage.pushed_keys().await, vec!["out.ts"]);
        assert_eq!(
            storage.metadata("media", "out.ts").await,
            Some(ObjectMetadata::segment())
        );
        assert_eq!(storage.keys("media").await, vec!["in.mp4", "out.ts"]);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let temp = TempDir::new().unwrap();
        let storage = MockStorage::new();
        storage.insert("media", "in.mp4", b"abc".to_vec()).await;
        let dest = temp.path().join("in.mp4");

        storage.fail_next_fetch(InjectedFailure::AccessDenied).await;
        let err = storage.fetch("media", "in.mp4", &dest).await.unwrap_err();
        assert!(matches!(err, StorageError::AccessDenied { .. }));
        // One-shot
        storage.fetch("media", "in.mp4", &dest).await.unwrap();

        storage.fail_push_at(1, InjectedFailure::Transient).await;
        let meta = ObjectMetadata::segment();
        storage.push(&dest, "media", "a.ts", &meta).await.unwrap();
        let err = storage.push(&dest, "media", "b.ts", &meta).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(storage.pushed_keys().await, vec!["a.ts"]);
    }
}
