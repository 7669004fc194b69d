//! Types for the codec module.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::ladder::RenditionSpec;

/// Extension of per-tier and master playlists.
pub const PLAYLIST_EXTENSION: &str = "m3u8";

/// Extension of transport-stream segments.
pub const SEGMENT_EXTENSION: &str = "ts";

static SEGMENT_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<base>.+)_(?P<tier>[A-Za-z0-9]+)_(?P<index>[0-9]{3,})\.ts$")
        .expect("segment name pattern is valid")
});

/// Filename of a tier's own playlist: `{base}_{tier}.m3u8`.
pub fn playlist_file_name(base_name: &str, tier: &str) -> String {
    format!("{}_{}.{}", base_name, tier, PLAYLIST_EXTENSION)
}

/// The `-hls_segment_filename` template for a tier:
/// `{output_dir}/{base}_{tier}_%03d.ts`.
///
/// ffmpeg expands `%` sequences anywhere in the template, so literal `%` in
/// the directory or base name is written as `%%`.
pub fn segment_file_pattern(output_dir: &Path, base_name: &str, tier: &str) -> String {
    let file_name = format!("{}_{}_", base_name, tier);
    let literal = output_dir.join(file_name).to_string_lossy().replace('%', "%%");
    format!("{}%03d.{}", literal, SEGMENT_EXTENSION)
}

/// A parsed segment filename, `{base}_{tier}_{NNN}.ts`.
///
/// Tier names never contain `_`, so the last two underscores delimit the
/// fields even when the base name has underscores of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentName {
    pub base_name: String,
    pub tier: String,
    pub index: u32,
}

impl SegmentName {
    pub fn new(base_name: impl Into<String>, tier: impl Into<String>, index: u32) -> Self {
        Self {
            base_name: base_name.into(),
            tier: tier.into(),
            index,
        }
    }

    /// Parses a segment filename. Returns `None` for anything else.
    pub fn parse(file_name: &str) -> Option<Self> {
        let caps = SEGMENT_NAME_RE.captures(file_name)?;
        let index = caps.name("index")?.as_str().parse().ok()?;
        Some(Self {
            base_name: caps.name("base")?.as_str().to_string(),
            tier: caps.name("tier")?.as_str().to_string(),
            index,
        })
    }

    /// Whether this segment belongs to the given base name and tier.
    pub fn belongs_to(&self, base_name: &str, tier: &str) -> bool {
        self.base_name == base_name && self.tier == tier
    }
}

impl fmt::Display for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{:03}.{}",
            self.base_name, self.tier, self.index, SEGMENT_EXTENSION
        )
    }
}

/// The local output of one tier encode.
#[derive(Debug, Clone, Serialize)]
pub struct RenditionArtifact {
    /// The tier this artifact was produced for.
    pub rendition: RenditionSpec,
    /// Path of the tier playlist.
    pub playlist_path: PathBuf,
    /// Segment files in playback order.
    pub segments: Vec<PathBuf>,
    /// Wall-clock encode time in milliseconds.
    pub duration_ms: u64,
}

impl RenditionArtifact {
    pub fn tier_name(&self) -> &str {
        &self.rendition.name
    }

    /// Playlist filename relative to the output directory.
    pub fn playlist_file_name(&self) -> String {
        file_name_of(&self.playlist_path)
    }

    /// Every local file belonging to this tier, playlist first.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.playlist_path.as_path()).chain(self.segments.iter().map(|p| p.as_path()))
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::RenditionPlan;

    #[test]
    fn test_segment_name_display() {
        let name = SegmentName::new("lecture", "480p", 7);
        assert_eq!(name.to_string(), "lecture_480p_007.ts");
    }

    #[test]
    fn test_segment_name_parses_back() {
        for (base, tier, index) in [
            ("lecture", "480p", 0),
            ("my_long_video_name", "1080p", 42),
            ("clip 2024", "720p", 999),
            ("x", "144p", 1234),
        ] {
            let name = SegmentName::new(base, tier, index);
            let parsed = SegmentName::parse(&name.to_string()).unwrap();
            assert_eq!(parsed, name);
        }
    }

    #[test]
    fn test_segment_name_rejects_other_files() {
        assert!(SegmentName::parse("lecture_480p.m3u8").is_none());
        assert!(SegmentName::parse("lecture.m3u8").is_none());
        assert!(SegmentName::parse("lecture_480p_1.ts").is_none());
        assert!(SegmentName::parse("lecture_480p_001.mp4").is_none());
    }

    #[test]
    fn test_file_name_helpers() {
        assert_eq!(playlist_file_name("lecture", "720p"), "lecture_720p.m3u8");
        assert_eq!(
            segment_file_pattern(Path::new("/scratch/run"), "lecture", "720p"),
            "/scratch/run/lecture_720p_%03d.ts"
        );
    }

    #[test]
    fn test_segment_pattern_escapes_literal_percent() {
        assert_eq!(
            segment_file_pattern(Path::new("/scratch/run"), "clip%5d", "480p"),
            "/scratch/run/clip%%5d_480p_%03d.ts"
        );
        assert_eq!(
            segment_file_pattern(Path::new("/tmp/100%/run"), "clip", "480p"),
            "/tmp/100%%/run/clip_480p_%03d.ts"
        );
        // the file ffmpeg writes still parses back to the original base
        let name = SegmentName::parse("clip%5d_480p_000.ts").unwrap();
        assert_eq!(name.base_name, "clip%5d");
    }

    #[test]
    fn test_artifact_files_playlist_first() {
        let rendition = RenditionPlan::standard().tiers()[0].clone();
        let artifact = RenditionArtifact {
            rendition,
            playlist_path: PathBuf::from("/out/a_480p.m3u8"),
            segments: vec![
                PathBuf::from("/out/a_480p_000.ts"),
                PathBuf::from("/out/a_480p_001.ts"),
            ],
            duration_ms: 10,
        };
        let files: Vec<_> = artifact.files().collect();
        assert_eq!(files[0], Path::new("/out/a_480p.m3u8"));
        assert_eq!(files.len(), 3);
        assert_eq!(artifact.playlist_file_name(), "a_480p.m3u8");
        assert_eq!(artifact.tier_name(), "480p");
    }
}
