//! Error types for the storage module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while talking to the object store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The object does not exist.
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// The caller is not allowed to read or write the object.
    #[error("access denied: {bucket}/{key}")]
    AccessDenied { bucket: String, key: String },

    /// A failure that may succeed on redelivery (network, throttling, 5xx).
    #[error("{operation} {bucket}/{key} failed: {reason}")]
    Transient {
        operation: &'static str,
        bucket: String,
        key: String,
        reason: String,
    },

    /// The key cannot be mapped to a storage location.
    #[error("invalid object key: {key:?}")]
    InvalidKey { key: String },

    /// Local file I/O failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backend could not be configured.
    #[error("storage configuration error: {0}")]
    Config(String),
}

impl StorageError {
    pub fn not_found(bucket: &str, key: &str) -> Self {
        Self::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }

    pub fn access_denied(bucket: &str, key: &str) -> Self {
        Self::AccessDenied {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }

    pub fn transient(
        operation: &'static str,
        bucket: &str,
        key: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::Transient {
            operation,
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable classification.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AccessDenied { .. } => "access_denied",
            Self::Transient { .. } => "transient",
            Self::InvalidKey { .. } => "invalid_key",
            Self::Io { .. } => "io",
            Self::Config(_) => "config",
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Io { .. })
    }
}
