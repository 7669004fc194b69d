//! S3 and S3-compatible object store.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Instant;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use super::config::S3Config;
use super::error::StorageError;
use super::traits::ObjectStorage;
use super::types::{encode_key, ObjectInfo, ObjectMetadata, PushReceipt};

/// How an S3 error code maps onto [`StorageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorClass {
    NotFound,
    AccessDenied,
    Transient,
}

fn classify_code(code: Option<&str>) -> ErrorClass {
    match code {
        Some("NoSuchKey") | Some("NotFound") | Some("NoSuchBucket") => ErrorClass::NotFound,
        Some("AccessDenied") | Some("Forbidden") | Some("AllAccessDisabled") => {
            ErrorClass::AccessDenied
        }
        _ => ErrorClass::Transient,
    }
}

fn map_sdk_error<E, R>(
    operation: &'static str,
    bucket: &str,
    key: &str,
    err: SdkError<E, R>,
) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match classify_code(err.code()) {
        ErrorClass::NotFound => StorageError::not_found(bucket, key),
        ErrorClass::AccessDenied => StorageError::access_denied(bucket, key),
        ErrorClass::Transient => {
            StorageError::transient(operation, bucket, key, DisplayErrorContext(&err).to_string())
        }
    }
}

/// Public URL for an object under the given S3 settings.
pub fn s3_object_url(config: &S3Config, bucket: &str, key: &str) -> String {
    let key = encode_key(key);
    if let Some(base) = &config.public_base_url {
        return format!("{}/{}", base.trim_end_matches('/'), key);
    }
    if let Some(endpoint) = &config.endpoint_url {
        return format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key);
    }
    format!("https://{}.s3.{}.amazonaws.com/{}", bucket, config.region, key)
}

/// Object store backed by the AWS SDK.
pub struct S3Storage {
    client: Client,
    config: S3Config,
}

impl S3Storage {
    /// Builds a client from the ambient AWS credential chain and `config`.
    pub async fn new(config: S3Config) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder =
            aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(config.force_path_style);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            config,
        }
    }

    /// Wraps an already configured client.
    pub fn from_client(client: Client, config: S3Config) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    fn name(&self) -> &str {
        "s3"
    }

    async fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64, StorageError> {
        let start = Instant::now();

        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error("get_object", bucket, key, e))?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }
        let mut file = File::create(dest)
            .await
            .map_err(|e| StorageError::io(dest, e))?;

        let mut body = output.body;
        let mut total_bytes = 0u64;
        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|e| StorageError::transient("get_object", bucket, key, e.to_string()))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| StorageError::io(dest, e))?;
            total_bytes += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| StorageError::io(dest, e))?;

        debug!(
            bucket = %bucket,
            key = %key,
            bytes = total_bytes,
            duration_ms = start.elapsed().as_millis() as u64,
            "Downloaded object"
        );
        Ok(total_bytes)
    }

    async fn push(
        &self,
        src: &Path,
        bucket: &str,
        key: &str,
        metadata: &ObjectMetadata,
    ) -> Result<PushReceipt, StorageError> {
        let start = Instant::now();
        let size_bytes = fs::metadata(src)
            .await
            .map_err(|e| StorageError::io(src, e))?
            .len();
        let body = ByteStream::from_path(src)
            .await
            .map_err(|e| StorageError::transient("put_object", bucket, key, e.to_string()))?;

        let output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_length(size_bytes as i64)
            .content_type(&metadata.content_type)
            .cache_control(&metadata.cache_control)
            .send()
            .await
            .map_err(|e| {
                let err = map_sdk_error("put_object", bucket, key, e);
                error!(bucket = %bucket, key = %key, error = %err, "S3 upload failed");
                err
            })?;

        debug!(
            bucket = %bucket,
            key = %key,
            bytes = size_bytes,
            duration_ms = start.elapsed().as_millis() as u64,
            "Uploaded object"
        );

        Ok(PushReceipt {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size_bytes,
            etag: output.e_tag().map(|t| t.trim_matches('"').to_string()),
        })
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket).prefix(prefix);
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| map_sdk_error("list_objects_v2", bucket, prefix, e))?;

            for object in response.contents() {
                let Some(key) = object.key() else { continue };
                objects.push(ObjectInfo {
                    key: key.to_string(),
                    size_bytes: object.size().unwrap_or(0).max(0) as u64,
                    last_modified: object
                        .last_modified()
                        .and_then(|t| t.to_millis().ok())
                        .and_then(DateTime::<Utc>::from_timestamp_millis),
                });
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token().map(str::to_string);
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        Ok(objects)
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        match self
            .client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => match map_sdk_error("delete_object", bucket, key, e) {
                StorageError::NotFound { .. } => Ok(()),
                other => Err(other),
            },
        }
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        s3_object_url(&self.config, bucket, key)
    }

    async fn validate(&self) -> Result<(), StorageError> {
        if self.config.region.trim().is_empty() {
            return Err(StorageError::Config("s3 region is empty".to_string()));
        }
        info!(
            region = %self.config.region,
            endpoint = ?self.config.endpoint_url,
            path_style = self.config.force_path_style,
            "S3 storage configured"
        );
        Ok(())
    }
}
