//! Configuration for the transcoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for orchestration runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeConfig {
    /// Parent directory of every per-run scratch workspace.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Key suffixes accepted as sources, matched case-insensitively.
    #[serde(default = "default_accepted_suffixes")]
    pub accepted_suffixes: Vec<String>,

    /// Wall-clock ceiling for one run, fetch to last upload.
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,

    /// Sources larger than this are rejected before download.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_source_bytes: Option<u64>,

    /// Maximum runs in flight within this process.
    #[serde(default = "default_max_concurrent_runs")]
    pub max_concurrent_runs: usize,

    /// Upload the master playlist after every other object instead of first.
    #[serde(default)]
    pub master_manifest_last: bool,
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("hlsforge")
}

fn default_accepted_suffixes() -> Vec<String> {
    vec![".mp4".to_string()]
}

fn default_run_timeout() -> u64 {
    840 // 14 minutes
}

fn default_max_concurrent_runs() -> usize {
    1
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
            accepted_suffixes: default_accepted_suffixes(),
            run_timeout_secs: default_run_timeout(),
            max_source_bytes: None,
            max_concurrent_runs: default_max_concurrent_runs(),
            master_manifest_last: false,
        }
    }
}

impl TranscodeConfig {
    /// Creates a config rooted at the given scratch directory.
    pub fn with_scratch_dir(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            ..Default::default()
        }
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    /// Whether `key` ends in one of the accepted suffixes.
    pub fn accepts(&self, key: &str) -> bool {
        let key = key.to_ascii_lowercase();
        self.accepted_suffixes
            .iter()
            .any(|suffix| key.ends_with(&suffix.to_ascii_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TranscodeConfig::default();
        assert_eq!(config.accepted_suffixes, vec![".mp4"]);
        assert_eq!(config.run_timeout(), Duration::from_secs(840));
        assert_eq!(config.max_concurrent_runs, 1);
        assert!(!config.master_manifest_last);
        assert!(config.scratch_dir.ends_with("hlsforge"));
    }

    #[test]
    fn test_accepts_is_case_insensitive() {
        let config = TranscodeConfig::default();
        assert!(config.accepts("courses/101/lecture.mp4"));
        assert!(config.accepts("LECTURE.MP4"));
        assert!(config.accepts("Lecture.Mp4"));
        assert!(!config.accepts("thumbnail.png"));
        assert!(!config.accepts("lecture.mp4.bak"));
        assert!(!config.accepts("mp4"));
    }

    #[test]
    fn test_accepts_multiple_suffixes() {
        let config = TranscodeConfig {
            accepted_suffixes: vec![".mp4".to_string(), ".MOV".to_string()],
            ..Default::default()
        };
        assert!(config.accepts("clip.mov"));
        assert!(config.accepts("clip.mp4"));
        assert!(!config.accepts("clip.mkv"));
    }
}
