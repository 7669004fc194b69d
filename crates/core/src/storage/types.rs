//! Types for the storage module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MIME type of HLS playlists.
pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// MIME type of MPEG transport-stream segments.
pub const SEGMENT_CONTENT_TYPE: &str = "video/mp2t";

/// Playlists can be rewritten by a later run, so they must not be cached.
pub const PLAYLIST_CACHE_CONTROL: &str = "no-cache";

/// Segments never change once written.
pub const SEGMENT_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Headers stored with an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub content_type: String,
    pub cache_control: String,
}

impl ObjectMetadata {
    pub fn new(content_type: impl Into<String>, cache_control: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            cache_control: cache_control.into(),
        }
    }

    /// Metadata for master and tier playlists.
    pub fn playlist() -> Self {
        Self::new(PLAYLIST_CONTENT_TYPE, PLAYLIST_CACHE_CONTROL)
    }

    /// Metadata for media segments.
    pub fn segment() -> Self {
        Self::new(SEGMENT_CONTENT_TYPE, SEGMENT_CACHE_CONTROL)
    }
}

/// Receipt for a completed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReceipt {
    pub bucket: String,
    pub key: String,
    pub size_bytes: u64,
    /// Entity tag or content checksum reported by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// A listed object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub key: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Joins a directory prefix and a filename into an object key.
///
/// An empty directory yields the bare filename.
pub fn join_key(dir: &str, file_name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", dir, file_name)
    }
}

/// Splits an object key into its directory prefix and filename.
pub fn split_key(key: &str) -> (&str, &str) {
    match key.rfind('/') {
        Some(idx) => (&key[..idx], &key[idx + 1..]),
        None => ("", key),
    }
}

/// Percent-encodes each `/`-separated segment of a key for use in a URL.
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_presets() {
        let playlist = ObjectMetadata::playlist();
        assert_eq!(playlist.content_type, "application/vnd.apple.mpegurl");
        assert_eq!(playlist.cache_control, "no-cache");

        let segment = ObjectMetadata::segment();
        assert_eq!(segment.content_type, "video/mp2t");
        assert!(segment.cache_control.contains("immutable"));
    }

    #[test]
    fn test_join_and_split_key() {
        assert_eq!(join_key("courses/101", "lecture.m3u8"), "courses/101/lecture.m3u8");
        assert_eq!(join_key("courses/101/", "lecture.m3u8"), "courses/101/lecture.m3u8");
        assert_eq!(join_key("", "lecture.m3u8"), "lecture.m3u8");

        assert_eq!(split_key("courses/101/lecture.mp4"), ("courses/101", "lecture.mp4"));
        assert_eq!(split_key("lecture.mp4"), ("", "lecture.mp4"));
    }

    #[test]
    fn test_encode_key_keeps_separators() {
        assert_eq!(encode_key("courses/101/lecture.m3u8"), "courses/101/lecture.m3u8");
        assert_eq!(
            encode_key("My Videos/intro talk #1.m3u8"),
            "My%20Videos/intro%20talk%20%231.m3u8"
        );
        assert_eq!(encode_key("a?b/c%d.ts"), "a%3Fb/c%25d.ts");
    }
}
