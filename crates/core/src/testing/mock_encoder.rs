//! Mock encoder for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::codec::{
    playlist_file_name, CodecError, Encoder, RenditionArtifact, SegmentName,
};
use crate::ladder::RenditionSpec;
use crate::manifest::master_file_name;

/// A recorded `produce` call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedEncode {
    pub tier: String,
    pub input: PathBuf,
    pub output_dir: PathBuf,
    /// Whether the call produced an artifact.
    pub success: bool,
}

/// Mock implementation of the Encoder trait.
///
/// Writes small deterministic playlists and segments instead of running a
/// real encoder:
/// - Records every call in order
/// - Fails on a chosen tier
/// - Delays each call
/// - Blocks the master playlist path so the manifest write fails
///
/// # Example
///
/// ```rust,ignore
/// use hlsforge_core::testing::MockEncoder;
///
/// let encoder = MockEncoder::new().fail_on_tier("720p");
/// // ... run the orchestrator ...
/// assert_eq!(encoder.recorded_tiers().await, vec!["480p", "720p"]);
/// ```
#[derive(Debug, Clone)]
pub struct MockEncoder {
    calls: Arc<RwLock<Vec<RecordedEncode>>>,
    fail_tier: Option<String>,
    delay: Option<Duration>,
    segments_per_tier: u32,
    block_master_manifest: bool,
}

impl Default for MockEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEncoder {
    /// Create a mock encoder that writes three segments per tier.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            fail_tier: None,
            delay: None,
            segments_per_tier: 3,
            block_master_manifest: false,
        }
    }

    /// Fail with a non-zero exit when asked to produce `tier`.
    pub fn fail_on_tier(mut self, tier: impl Into<String>) -> Self {
        self.fail_tier = Some(tier.into());
        self
    }

    /// Sleep this long in every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_segments(mut self, count: u32) -> Self {
        self.segments_per_tier = count;
        self
    }

    /// Put a directory where the master playlist would go.
    pub fn block_master_manifest(mut self) -> Self {
        self.block_master_manifest = true;
        self
    }

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedEncode> {
        self.calls.read().await.clone()
    }

    /// Tier names in the order they were requested.
    pub async fn recorded_tiers(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .map(|c| c.tier.clone())
            .collect()
    }

    /// Get the number of `produce` calls.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    async fn record(&self, rendition: &RenditionSpec, input: &Path, output_dir: &Path, success: bool) {
        self.calls.write().await.push(RecordedEncode {
            tier: rendition.name.clone(),
            input: input.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            success,
        });
    }

    async fn write_outputs(
        &self,
        output_dir: &Path,
        base_name: &str,
        rendition: &RenditionSpec,
    ) -> std::io::Result<RenditionArtifact> {
        tokio::fs::create_dir_all(output_dir).await?;

        if self.block_master_manifest {
            tokio::fs::create_dir_all(output_dir.join(master_file_name(base_name))).await?;
        }

        let mut playlist = format!(
            "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:{}\n#EXT-X-PLAYLIST-TYPE:VOD\n",
            rendition.segment_duration_secs
        );
        let mut segments = Vec::new();
        for index in 0..self.segments_per_tier {
            let name = SegmentName::new(base_name, &rendition.name, index).to_string();
            let path = output_dir.join(&name);
            tokio::fs::write(&path, format!("segment {} {}", rendition.name, index)).await?;
            playlist.push_str(&format!(
                "#EXTINF:{}.000000,\n{}\n",
                rendition.segment_duration_secs, name
            ));
            segments.push(path);
        }
        playlist.push_str("#EXT-X-ENDLIST\n");

        let playlist_path = output_dir.join(playlist_file_name(base_name, &rendition.name));
        tokio::fs::write(&playlist_path, playlist).await?;

        Ok(RenditionArtifact {
            rendition: rendition.clone(),
            playlist_path,
            segments,
            duration_ms: 1,
        })
    }
}

#[async_trait]
impl Encoder for MockEncoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn produce(
        &self,
        input: &Path,
        output_dir: &Path,
        base_name: &str,
        rendition: &RenditionSpec,
    ) -> Result<RenditionArtifact, CodecError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if !input.exists() {
            self.record(rendition, input, output_dir, false).await;
            return Err(CodecError::InputNotFound {
                tier: rendition.name.clone(),
                path: input.to_path_buf(),
            });
        }

        if self.fail_tier.as_deref() == Some(rendition.name.as_str()) {
            self.record(rendition, input, output_dir, false).await;
            return Err(CodecError::encode_failed(
                rendition.name.clone(),
                Some(1),
                Some("mock encoder failure".to_string()),
            ));
        }

        match self.write_outputs(output_dir, base_name, rendition).await {
            Ok(artifact) => {
                self.record(rendition, input, output_dir, true).await;
                Ok(artifact)
            }
            Err(source) => {
                self.record(rendition, input, output_dir, false).await;
                Err(CodecError::Io {
                    tier: rendition.name.clone(),
                    source,
                })
            }
        }
    }

    async fn validate(&self) -> Result<(), CodecError> {
        Ok(())
    }
}
