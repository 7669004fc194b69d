//! Storage module: object store access for sources and published outputs.
//!
//! The transcoder only talks to [`ObjectStorage`]; the host picks a backend
//! from [`StorageConfig`] with [`create_storage`].

mod config;
mod error;
mod local;
mod s3;
mod traits;
mod types;

pub use config::{LocalStorageConfig, S3Config, StorageBackend, StorageConfig};
pub use error::StorageError;
pub use local::LocalStorage;
pub use s3::{s3_object_url, S3Storage};
pub use traits::ObjectStorage;
pub use types::{
    encode_key, join_key, split_key, ObjectInfo, ObjectMetadata, PushReceipt, PLAYLIST_CACHE_CONTROL,
    PLAYLIST_CONTENT_TYPE, SEGMENT_CACHE_CONTROL, SEGMENT_CONTENT_TYPE,
};

use std::sync::Arc;

/// Builds the configured storage backend.
pub async fn create_storage(config: &StorageConfig) -> Arc<dyn ObjectStorage> {
    match config.backend {
        StorageBackend::S3 => Arc::new(S3Storage::new(config.s3.clone()).await),
        StorageBackend::Local => Arc::new(LocalStorage::new(config.local.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_local_storage() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Local,
            local: LocalStorageConfig::with_root(temp.path()),
            ..Default::default()
        };
        let storage = create_storage(&config).await;
        assert_eq!(storage.name(), "local");
    }
}
