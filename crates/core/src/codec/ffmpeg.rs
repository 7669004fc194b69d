//! FFmpeg-based encoder implementation.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::config::EncoderConfig;
use super::error::CodecError;
use super::traits::Encoder;
use super::types::{playlist_file_name, segment_file_pattern, RenditionArtifact, SegmentName};
use crate::ladder::RenditionSpec;

/// Number of trailing stderr lines kept as failure diagnostics.
const STDERR_TAIL_LINES: usize = 20;

/// FFmpeg-based encoder producing HLS renditions.
pub struct FfmpegEncoder {
    config: EncoderConfig,
}

impl FfmpegEncoder {
    /// Creates a new FFmpeg encoder with the given configuration.
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Creates an encoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EncoderConfig::default())
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Scale to fit inside the target box, then pad to exactly the box.
    fn filter_expression(rendition: &RenditionSpec) -> String {
        let (w, h) = (rendition.width, rendition.height);
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2"
        )
    }

    /// Builds the ffmpeg argument vector for one tier.
    fn build_args(
        &self,
        input: &Path,
        output_dir: &Path,
        base_name: &str,
        rendition: &RenditionSpec,
    ) -> Vec<String> {
        let segment_secs = rendition.segment_duration_secs;

        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-loglevel".to_string(),
            self.config.log_level.clone(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
        ];

        // Video
        args.extend([
            "-vf".to_string(),
            Self::filter_expression(rendition),
            "-c:v".to_string(),
            self.config.video_codec.clone(),
            "-preset".to_string(),
            self.config.preset.clone(),
            "-crf".to_string(),
            rendition.crf.to_string(),
            "-maxrate".to_string(),
            format!("{}k", rendition.video_bitrate_kbps),
            "-bufsize".to_string(),
            format!("{}k", rendition.buffer_size_kbits),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            // Keyframe on every segment boundary so all tiers cut at the same timestamps
            "-force_key_frames".to_string(),
            format!("expr:gte(t,n_forced*{})", segment_secs),
        ]);

        // Audio
        args.extend([
            "-c:a".to_string(),
            self.config.audio_codec.clone(),
            "-b:a".to_string(),
            format!("{}k", rendition.audio_bitrate_kbps),
            "-ac".to_string(),
            "2".to_string(),
        ]);

        args.extend(self.config.extra_args.iter().cloned());

        // Segmenting
        args.extend([
            "-f".to_string(),
            "hls".to_string(),
            "-hls_time".to_string(),
            segment_secs.to_string(),
            "-hls_playlist_type".to_string(),
            "vod".to_string(),
            "-hls_segment_filename".to_string(),
            segment_file_pattern(output_dir, base_name, &rendition.name),
        ]);

        args.push(
            output_dir
                .join(playlist_file_name(base_name, &rendition.name))
                .to_string_lossy()
                .to_string(),
        );

        args
    }

    /// Lists the tier's segments in `output_dir`, ordered by index.
    async fn collect_segments(
        output_dir: &Path,
        base_name: &str,
        tier: &str,
    ) -> Result<Vec<PathBuf>, CodecError> {
        let io_err = |source| CodecError::Io {
            tier: tier.to_string(),
            source,
        };

        let mut entries = tokio::fs::read_dir(output_dir).await.map_err(io_err)?;
        let mut segments = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str().and_then(SegmentName::parse) else {
                continue;
            };
            if name.belongs_to(base_name, tier) {
                segments.push((name.index, entry.path()));
            }
        }

        segments.sort_by_key(|(index, _)| *index);
        Ok(segments.into_iter().map(|(_, path)| path).collect())
    }

    async fn run_encode(
        &self,
        input: &Path,
        output_dir: &Path,
        base_name: &str,
        rendition: &RenditionSpec,
    ) -> Result<RenditionArtifact, CodecError> {
        let start = Instant::now();
        let tier = rendition.name.as_str();

        if !input.exists() {
            return Err(CodecError::InputNotFound {
                tier: tier.to_string(),
                path: input.to_path_buf(),
            });
        }

        tokio::fs::create_dir_all(output_dir).await.map_err(|_| {
            CodecError::OutputDirectoryFailed {
                tier: tier.to_string(),
                path: output_dir.to_path_buf(),
            }
        })?;

        let args = self.build_args(input, output_dir, base_name, rendition);
        debug!(tier, ?args, "Starting ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CodecError::EncoderMissing {
                        tier: tier.to_string(),
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    CodecError::Io {
                        tier: tier.to_string(),
                        source: e,
                    }
                }
            })?;

        let stderr = child.stderr.take();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let tail = match stderr {
                Some(stderr) => stderr_tail(BufReader::new(stderr)).await,
                None => VecDeque::new(),
            };

            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, tail))
        })
        .await;

        match result {
            Ok(Ok((status, tail))) => {
                if !status.success() {
                    let stderr = if tail.is_empty() {
                        None
                    } else {
                        Some(Vec::from(tail).join("\n"))
                    };
                    return Err(CodecError::encode_failed(tier, status.code(), stderr));
                }
            }
            Ok(Err(e)) => {
                return Err(CodecError::Io {
                    tier: tier.to_string(),
                    source: e,
                })
            }
            Err(_) => {
                // Kill the process on timeout
                if let Err(e) = child.kill().await {
                    warn!(tier, error = %e, "Failed to kill timed out ffmpeg");
                }
                return Err(CodecError::Timeout {
                    tier: tier.to_string(),
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        let playlist_path = output_dir.join(playlist_file_name(base_name, tier));
        if tokio::fs::metadata(&playlist_path).await.is_err() {
            return Err(CodecError::missing_output(
                tier,
                format!("playlist not created: {}", playlist_path.display()),
            ));
        }

        let segments = Self::collect_segments(output_dir, base_name, tier).await?;
        if segments.is_empty() {
            return Err(CodecError::missing_output(tier, "no segments produced"));
        }

        Ok(RenditionArtifact {
            rendition: rendition.clone(),
            playlist_path,
            segments,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn produce(
        &self,
        input: &Path,
        output_dir: &Path,
        base_name: &str,
        rendition: &RenditionSpec,
    ) -> Result<RenditionArtifact, CodecError> {
        self.run_encode(input, output_dir, base_name, rendition).await
    }

    async fn validate(&self) -> Result<(), CodecError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CodecError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    CodecError::Unavailable {
                        reason: e.to_string(),
                    }
                }
            })?;

        if !output.status.success() {
            return Err(CodecError::Unavailable {
                reason: format!(
                    "ffmpeg -version exited with code {:?}: {}",
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(())
    }
}

/// Reads `reader` to the end, keeping the last lines.
///
/// Lines that are not valid UTF-8 are kept lossily so the pipe is always
/// drained and the child never blocks on a full stderr buffer.
async fn stderr_tail<R: AsyncBufRead + Unpin>(mut reader: R) -> VecDeque<String> {
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                let line = String::from_utf8_lossy(&buf);
                tail.push_back(line.trim_end_matches(['\r', '\n']).to_string());
            }
            Err(e) => {
                debug!(error = %e, "Stopped reading ffmpeg stderr");
                break;
            }
        }
    }
    tail
}
