//! Configuration for the codec module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Timeout for a single tier encode in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Video encoder name passed to `-c:v`.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Encoder speed preset passed to `-preset`.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Audio encoder name passed to `-c:a`.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Additional ffmpeg arguments, inserted before the output options.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_timeout() -> u64 {
    600 // 10 minutes per tier
}

fn default_log_level() -> String {
    "error".to_string()
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            timeout_secs: default_timeout(),
            log_level: default_log_level(),
            video_codec: default_video_codec(),
            preset: default_preset(),
            audio_codec: default_audio_codec(),
            extra_args: Vec::new(),
        }
    }
}

impl EncoderConfig {
    /// Creates a new config with a custom ffmpeg path.
    pub fn with_path(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ..Default::default()
        }
    }

    /// Sets the per-tier timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the encoder speed preset.
    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EncoderConfig::default();
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.timeout_secs, 600);
        assert_eq!(config.video_codec, "libx264");
        assert_eq!(config.audio_codec, "aac");
    }

    #[test]
    fn test_config_builder() {
        let config = EncoderConfig::with_path(PathBuf::from("/usr/local/bin/ffmpeg"))
            .with_timeout(120)
            .with_preset("medium");

        assert_eq!(config.ffmpeg_path, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.preset, "medium");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EncoderConfig = toml::from_str("timeout_secs = 30").unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.log_level, "error");
    }
}
