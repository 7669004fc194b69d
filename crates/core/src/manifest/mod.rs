//! Manifest module: the master HLS playlist tying the tier playlists together.
//!
//! Bandwidth values are computed from the rendition plan, not measured, so the
//! same plan and base name always produce a byte-identical playlist.

mod builder;

pub use builder::{
    master_file_name, ManifestBuilder, ManifestEntry, ManifestError, MasterManifest,
    AUDIO_CODEC_TAG, VIDEO_CODEC_TAG,
};
