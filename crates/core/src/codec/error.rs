//! Error types for the codec module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while producing a rendition.
///
/// Every variant that can happen mid-encode carries the tier name so a failed
/// run can be diagnosed from its result record alone.
#[derive(Debug, Error)]
pub enum CodecError {
    /// FFmpeg binary not found by the startup check.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFmpeg binary vanished before a tier could be encoded.
    #[error("tier {tier}: FFmpeg not found at path: {path}")]
    EncoderMissing { tier: String, path: PathBuf },

    /// FFmpeg exists but did not answer a version query.
    #[error("FFmpeg unavailable: {reason}")]
    Unavailable { reason: String },

    /// Input file not found.
    #[error("tier {tier}: input file not found: {path}")]
    InputNotFound { tier: String, path: PathBuf },

    /// Output directory does not exist and could not be created.
    #[error("tier {tier}: failed to create output directory: {path}")]
    OutputDirectoryFailed { tier: String, path: PathBuf },

    /// The encoder exited with a non-zero status.
    #[error("tier {tier}: encoder exited with code {code:?}")]
    EncodeFailed {
        tier: String,
        code: Option<i32>,
        stderr: Option<String>,
    },

    /// The encode exceeded the per-tier timeout.
    #[error("tier {tier}: encode timed out after {timeout_secs} seconds")]
    Timeout { tier: String, timeout_secs: u64 },

    /// The encoder reported success but the expected outputs are missing.
    #[error("tier {tier}: {reason}")]
    MissingOutput { tier: String, reason: String },

    /// I/O error while driving the encoder.
    #[error("tier {tier}: I/O error: {source}")]
    Io {
        tier: String,
        #[source]
        source: std::io::Error,
    },
}

impl CodecError {
    /// Creates an encode failed error with captured diagnostics.
    pub fn encode_failed(tier: impl Into<String>, code: Option<i32>, stderr: Option<String>) -> Self {
        Self::EncodeFailed {
            tier: tier.into(),
            code,
            stderr,
        }
    }

    /// Creates a missing output error.
    pub fn missing_output(tier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MissingOutput {
            tier: tier.into(),
            reason: reason.into(),
        }
    }

    /// The tier that failed, if the failure is tied to one.
    pub fn tier(&self) -> Option<&str> {
        match self {
            Self::EncoderMissing { tier, .. }
            | Self::InputNotFound { tier, .. }
            | Self::OutputDirectoryFailed { tier, .. }
            | Self::EncodeFailed { tier, .. }
            | Self::Timeout { tier, .. }
            | Self::MissingOutput { tier, .. }
            | Self::Io { tier, .. } => Some(tier),
            _ => None,
        }
    }

    /// The encoder's diagnostic output, if any was captured.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::EncodeFailed { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io { .. })
    }
}
