//! Configuration for the storage module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which object store backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    S3,
    Local,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub s3: S3Config,
    #[serde(default)]
    pub local: LocalStorageConfig,
}

/// S3 (or S3-compatible) backend configuration.
///
/// Credentials are resolved by the AWS provider chain, never from this file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Config {
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible stores (e.g. "http://localhost:9000").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    /// Use path-style addressing, required by most S3-compatible stores.
    #[serde(default)]
    pub force_path_style: bool,
    /// Base URL for published objects (CDN). Keys are appended as `{base}/{key}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint_url: None,
            force_path_style: false,
            public_base_url: None,
        }
    }
}

/// Directory-backed backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Root directory; buckets are its subdirectories.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Base URL for published objects. Keys are appended as `{base}/{bucket}/{key}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
    /// Buffer size for file copies in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_root() -> PathBuf {
    PathBuf::from("./data")
}

fn default_buffer_size() -> usize {
    1024 * 1024 // 1 MB
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            public_base_url: None,
            buffer_size: default_buffer_size(),
        }
    }
}

impl LocalStorageConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }
}
