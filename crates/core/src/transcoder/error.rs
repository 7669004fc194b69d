//! Error types for the transcoder module.

use std::path::PathBuf;
use thiserror::Error;

use crate::codec::CodecError;
use crate::manifest::ManifestError;
use crate::storage::StorageError;

use super::types::RunStage;

/// Why a run failed.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// The source could not be downloaded.
    #[error("{0}")]
    Fetch(#[source] StorageError),

    /// The notified source size is over the configured limit.
    #[error("source is {size} bytes, limit is {limit}")]
    SourceTooLarge { size: u64, limit: u64 },

    /// A tier failed to encode.
    #[error("{0}")]
    Codec(#[from] CodecError),

    /// The master playlist could not be written.
    #[error("{0}")]
    Manifest(#[from] ManifestError),

    /// An upload failed.
    #[error("{key}: {source}")]
    Push {
        key: String,
        #[source]
        source: StorageError,
    },

    /// An output key would overwrite the source object.
    #[error("output key {key} collides with the source object")]
    SourceOverwrite { key: String },

    /// The scratch workspace could not be created.
    #[error("cannot create scratch workspace {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run deadline elapsed.
    #[error("run exceeded {timeout_secs}s while {stage}")]
    DeadlineExceeded { timeout_secs: u64, stage: RunStage },
}

impl TranscodeError {
    /// Machine-readable reason.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) | Self::SourceTooLarge { .. } => "fetch_failure",
            Self::Codec(_) => "codec_failure",
            Self::Manifest(_) => "manifest_failure",
            Self::Push { .. } | Self::SourceOverwrite { .. } => "push_failure",
            Self::Workspace { .. } => "workspace_failure",
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
        }
    }

    /// The stage the run was in when this error occurred.
    pub fn stage(&self) -> RunStage {
        match self {
            Self::Fetch(_) | Self::SourceTooLarge { .. } | Self::Workspace { .. } => {
                RunStage::Fetching
            }
            Self::Codec(_) => RunStage::Encoding,
            Self::Manifest(_) => RunStage::Manifesting,
            Self::Push { .. } | Self::SourceOverwrite { .. } => RunStage::Pushing,
            Self::DeadlineExceeded { stage, .. } => *stage,
        }
    }

    /// The `"<kind>: <detail>"` string reported in results.
    pub fn report(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }

    /// Whether redelivering the same notification might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch(e) | Self::Push { source: e, .. } => e.is_retryable(),
            Self::Codec(e) => e.is_retryable(),
            Self::Manifest(_) | Self::Workspace { .. } | Self::DeadlineExceeded { .. } => true,
            Self::SourceTooLarge { .. } | Self::SourceOverwrite { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_report_names_tier() {
        let err = TranscodeError::from(CodecError::encode_failed("720p", Some(1), None));
        let report = err.report();
        assert!(report.starts_with("codec_failure: "));
        assert!(report.contains("720p"));
        assert_eq!(err.stage(), RunStage::Encoding);
    }

    #[test]
    fn test_fetch_kinds() {
        let err = TranscodeError::Fetch(StorageError::not_found("media", "a.mp4"));
        assert_eq!(err.kind(), "fetch_failure");
        assert!(!err.is_retryable());

        let err = TranscodeError::SourceTooLarge {
            size: 10,
            limit: 5,
        };
        assert_eq!(err.kind(), "fetch_failure");
        assert_eq!(err.stage(), RunStage::Fetching);
    }

    #[test]
    fn test_push_report_includes_key() {
        let err = TranscodeError::Push {
            key: "courses/101/lecture_480p_000.ts".to_string(),
            source: StorageError::transient("put_object", "media", "k", "503"),
        };
        assert!(err.report().starts_with("push_failure: courses/101/lecture_480p_000.ts"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_deadline_keeps_stage() {
        let err = TranscodeError::DeadlineExceeded {
            timeout_secs: 840,
            stage: RunStage::Pushing,
        };
        assert_eq!(err.kind(), "deadline_exceeded");
        assert_eq!(err.stage(), RunStage::Pushing);
        assert!(err.to_string().contains("pushing"));
    }
}
