//! Master playlist rendering.

use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::codec::{RenditionArtifact, PLAYLIST_EXTENSION};
use crate::ladder::RenditionSpec;

/// RFC 6381 tag advertised for the H.264 video track.
pub const VIDEO_CODEC_TAG: &str = "avc1.64001f";

/// RFC 6381 tag advertised for the AAC-LC audio track.
pub const AUDIO_CODEC_TAG: &str = "mp4a.40.2";

/// Errors that can occur while writing the master playlist.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// No renditions to reference.
    #[error("no renditions to reference")]
    Empty,

    /// Failed to write the playlist file.
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One `#EXT-X-STREAM-INF` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub rendition: RenditionSpec,
    /// Tier playlist path relative to the master playlist.
    pub uri: String,
}

/// The top-level playlist of one run.
#[derive(Debug, Clone, Serialize)]
pub struct MasterManifest {
    /// Where the playlist was written.
    pub path: PathBuf,
    /// Entries in ladder order.
    pub entries: Vec<ManifestEntry>,
}

impl MasterManifest {
    /// Renders the playlist body.
    pub fn render(&self) -> String {
        render_entries(&self.entries)
    }
}

/// Filename of the master playlist for a base name: `{base}.m3u8`.
pub fn master_file_name(base_name: &str) -> String {
    format!("{}.{}", base_name, PLAYLIST_EXTENSION)
}

fn render_entries(entries: &[ManifestEntry]) -> String {
    let mut body = String::from("#EXTM3U\n#EXT-X-VERSION:3\n\n");
    for entry in entries {
        let r = &entry.rendition;
        // Writing to a String cannot fail
        let _ = writeln!(
            body,
            "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={},CODECS=\"{},{}\"",
            r.bandwidth_bps(),
            r.resolution(),
            VIDEO_CODEC_TAG,
            AUDIO_CODEC_TAG
        );
        let _ = writeln!(body, "{}", entry.uri);
    }
    body
}

/// Builds the master playlist referencing every tier playlist.
#[derive(Debug, Clone, Default)]
pub struct ManifestBuilder;

impl ManifestBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Entries for the given artifacts, in the order given.
    ///
    /// Callers pass artifacts in ladder order; the output preserves it.
    pub fn entries(artifacts: &[RenditionArtifact]) -> Vec<ManifestEntry> {
        artifacts
            .iter()
            .map(|a| ManifestEntry {
                rendition: a.rendition.clone(),
                uri: a.playlist_file_name(),
            })
            .collect()
    }

    /// Writes `{output_dir}/{base_name}.m3u8`.
    pub async fn build(
        &self,
        base_name: &str,
        artifacts: &[RenditionArtifact],
        output_dir: &Path,
    ) -> Result<MasterManifest, ManifestError> {
        if artifacts.is_empty() {
            return Err(ManifestError::Empty);
        }

        let manifest = MasterManifest {
            path: output_dir.join(master_file_name(base_name)),
            entries: Self::entries(artifacts),
        };

        tokio::fs::write(&manifest.path, manifest.render())
            .await
            .map_err(|source| ManifestError::Io {
                path: manifest.path.clone(),
                source,
            })?;

        Ok(manifest)
    }
}
