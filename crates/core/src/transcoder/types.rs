//! Types for the transcoder module.

use serde::{Deserialize, Serialize};

use crate::storage::split_key;

/// An object to transcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReference {
    pub bucket: String,
    /// Decoded object key; may contain `/` separators.
    pub key: String,
    /// Size reported by the notification, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl SourceReference {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            size: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// The key's directory prefix, empty for top-level keys.
    pub fn directory(&self) -> &str {
        split_key(&self.key).0
    }

    /// The key's final path component.
    pub fn file_name(&self) -> &str {
        split_key(&self.key).1
    }

    /// The filename without its last extension.
    pub fn base_name(&self) -> &str {
        let file_name = self.file_name();
        match file_name.rfind('.') {
            Some(idx) if idx > 0 => &file_name[..idx],
            _ => file_name,
        }
    }

    /// The last extension without its dot, if any.
    pub fn extension(&self) -> Option<&str> {
        let file_name = self.file_name();
        match file_name.rfind('.') {
            Some(idx) if idx > 0 && idx + 1 < file_name.len() => Some(&file_name[idx + 1..]),
            _ => None,
        }
    }
}

/// Stage of an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Fetching,
    Encoding,
    Manifesting,
    Pushing,
    CleaningUp,
    Done,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Encoding => "encoding",
            Self::Manifesting => "manifesting",
            Self::Pushing => "pushing",
            Self::CleaningUp => "cleaning_up",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress update emitted on every stage transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum RunProgress {
    Fetching {
        key: String,
    },
    /// Encoding tier `index` (1-based) of `total`.
    Encoding {
        index: usize,
        total: usize,
        tier: String,
    },
    Manifesting,
    Pushing {
        uploaded: usize,
        total: usize,
    },
    CleaningUp,
    Done {
        success: bool,
    },
}

impl RunProgress {
    pub fn stage(&self) -> RunStage {
        match self {
            Self::Fetching { .. } => RunStage::Fetching,
            Self::Encoding { .. } => RunStage::Encoding,
            Self::Manifesting => RunStage::Manifesting,
            Self::Pushing { .. } => RunStage::Pushing,
            Self::CleaningUp => RunStage::CleaningUp,
            Self::Done { .. } => RunStage::Done,
        }
    }
}

/// Outcome of one run. Exactly one is produced per source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub bucket: String,
    pub source_key: String,
    pub success: bool,
    /// Keys written, in upload order. Empty on failure.
    pub uploaded_keys: Vec<String>,
    /// URL of the published master playlist. `None` on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_url: Option<String>,
    /// `"<kind>: <detail>"`. `None` on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<RunStage>,
    /// Set when the scratch workspace could not be removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_warning: Option<String>,
    pub elapsed_ms: u64,
}

impl ProcessingResult {
    pub fn succeeded(
        source: &SourceReference,
        uploaded_keys: Vec<String>,
        manifest_url: String,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            bucket: source.bucket.clone(),
            source_key: source.key.clone(),
            success: true,
            uploaded_keys,
            manifest_url: Some(manifest_url),
            error: None,
            failed_stage: None,
            cleanup_warning: None,
            elapsed_ms,
        }
    }

    pub fn failed(
        source: &SourceReference,
        error: String,
        failed_stage: RunStage,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            bucket: source.bucket.clone(),
            source_key: source.key.clone(),
            success: false,
            uploaded_keys: Vec::new(),
            manifest_url: None,
            error: Some(error),
            failed_stage: Some(failed_stage),
            cleanup_warning: None,
            elapsed_ms,
        }
    }

    pub fn with_cleanup_warning(mut self, warning: Option<String>) -> Self {
        self.cleanup_warning = warning;
        self
    }

    /// The machine-readable prefix of `error`.
    pub fn error_kind(&self) -> Option<&str> {
        self.error
            .as_deref()
            .map(|e| e.split_once(':').map(|(kind, _)| kind).unwrap_or(e))
    }
}
