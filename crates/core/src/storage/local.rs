//! Directory-backed object store.
//!
//! Buckets are subdirectories of the configured root and keys are relative
//! paths inside them. Useful for development and for hosts that serve the
//! output tree directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, warn};

use super::config::LocalStorageConfig;
use super::error::StorageError;
use super::traits::ObjectStorage;
use super::types::{encode_key, ObjectInfo, ObjectMetadata, PushReceipt};

/// Object store rooted at a local directory.
pub struct LocalStorage {
    config: LocalStorageConfig,
}

impl LocalStorage {
    pub fn new(config: LocalStorageConfig) -> Self {
        Self { config }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self::new(LocalStorageConfig::with_root(root))
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Maps `bucket/key` to a path under the root, rejecting anything that
    /// would escape it.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        check_segment(bucket)?;
        if key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }
        let relative = Path::new(key);
        for component in relative.components() {
            if !matches!(component, Component::Normal(_)) {
                return Err(StorageError::InvalidKey {
                    key: key.to_string(),
                });
            }
        }
        Ok(self.config.root.join(bucket).join(relative))
    }

    /// Streams `source` into `destination`, returning the byte count and the
    /// hex SHA-256 of the content.
    async fn copy_with_checksum(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<(u64, String), StorageError> {
        let source_file = File::open(source)
            .await
            .map_err(|e| StorageError::io(source, e))?;

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }

        // Write beside the destination and rename, so readers never see a
        // half-written object.
        let partial = partial_path(destination);
        let dest_file = File::create(&partial)
            .await
            .map_err(|e| StorageError::io(&partial, e))?;

        let buffer_size = self.config.buffer_size.max(4096);
        let mut reader = BufReader::with_capacity(buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(buffer_size, dest_file);
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; buffer_size];
        let mut total_bytes = 0u64;

        let copied: Result<(), std::io::Error> = async {
            loop {
                let bytes_read = reader.read(&mut buffer).await?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
                writer.write_all(&buffer[..bytes_read]).await?;
                total_bytes += bytes_read as u64;
            }
            writer.flush().await?;
            writer.get_ref().sync_all().await
        }
        .await;

        if let Err(e) = copied {
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::io(source, e));
        }

        fs::rename(&partial, destination)
            .await
            .map_err(|e| StorageError::io(destination, e))?;

        Ok((total_bytes, format!("{:x}", hasher.finalize())))
    }

    async fn walk(
        &self,
        bucket_root: &Path,
        prefix: &str,
    ) -> Result<Vec<ObjectInfo>, StorageError> {
        let mut objects = Vec::new();
        let mut pending = vec![bucket_root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::io(&dir, e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::io(&dir, e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| StorageError::io(&path, e))?;
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Some(key) = relative_key(bucket_root, &path) else {
                    continue;
                };
                if !key.starts_with(prefix) || key.ends_with(".partial") {
                    continue;
                }
                let meta = entry
                    .metadata()
                    .await
                    .map_err(|e| StorageError::io(&path, e))?;
                objects.push(ObjectInfo {
                    key,
                    size_bytes: meta.len(),
                    last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
                });
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}

fn check_segment(bucket: &str) -> Result<(), StorageError> {
    if bucket.is_empty() || bucket == "." || bucket == ".." || bucket.contains(['/', '\\']) {
        return Err(StorageError::Config(format!("invalid bucket name: {bucket:?}")));
    }
    Ok(())
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    destination.with_file_name(name)
}

fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    fn name(&self) -> &str {
        "local"
    }

    async fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, StorageError> {
        let source = self.object_path(bucket, key)?;
        match fs::metadata(&source).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(StorageError::not_found(bucket, key)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::not_found(bucket, key))
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(StorageError::access_denied(bucket, key))
            }
            Err(e) => return Err(StorageError::io(&source, e)),
        }

        let (bytes, _) = self.copy_with_checksum(&source, dest).await?;
        debug!(bucket = %bucket, key = %key, bytes, "Fetched object");
        Ok(bytes)
    }

    async fn push(
        &self,
        src: &Path,
        bucket: &str,
        key: &str,
        metadata: &ObjectMetadata,
    ) -> Result<PushReceipt, StorageError> {
        let destination = self.object_path(bucket, key)?;
        let (size_bytes, checksum) = self.copy_with_checksum(src, &destination).await?;

        debug!(
            bucket = %bucket,
            key = %key,
            bytes = size_bytes,
            content_type = %metadata.content_type,
            "Stored object"
        );

        Ok(PushReceipt {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size_bytes,
            etag: Some(checksum),
        })
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        check_segment(bucket)?;
        let bucket_root = self.config.root.join(bucket);
        self.walk(&bucket_root, prefix).await
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        match &self.config.public_base_url {
            Some(base) => format!(
                "{}/{}/{}",
                base.trim_end_matches('/'),
                encode_key(bucket),
                encode_key(key)
            ),
            None => {
                let path = self.config.root.join(bucket).join(key);
                format!("file://{}", encode_key(&path.display().to_string()))
            }
        }
    }

    async fn validate(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.config.root)
            .await
            .map_err(|e| StorageError::io(&self.config.root, e))?;

        let marker = self.config.root.join(".hlsforge-write-test");
        fs::write(&marker, b"ok")
            .await
            .map_err(|e| StorageError::io(&marker, e))?;
        if let Err(e) = fs::remove_file(&marker).await {
            warn!(path = %marker.display(), error = %e, "Failed to remove write marker");
        }
        Ok(())
    }
}
