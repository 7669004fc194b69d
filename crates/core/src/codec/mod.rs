//! Codec module: one external encoder invocation per rendition tier.
//!
//! This module provides the `Encoder` trait and an FFmpeg implementation that
//! scales and pads the input into the tier's box, encodes H.264/AAC under the
//! tier's bitrate ceiling, and segments the result into an HLS playlist.
//!
//! The encoder is invoked with an argument vector, never through a shell, so
//! object keys containing spaces or metacharacters are passed through intact.
//!
//! # Example
//!
//! ```ignore
//! use hlsforge_core::codec::{Encoder, EncoderConfig, FfmpegEncoder};
//! use hlsforge_core::ladder::RenditionPlan;
//!
//! let encoder = FfmpegEncoder::new(EncoderConfig::default());
//! encoder.validate().await?;
//!
//! let plan = RenditionPlan::standard();
//! let artifact = encoder
//!     .produce(Path::new("/tmp/in.mp4"), Path::new("/tmp/out"), "lecture", &plan.tiers()[0])
//!     .await?;
//! println!("{} segments", artifact.segments.len());
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::EncoderConfig;
pub use error::CodecError;
pub use ffmpeg::FfmpegEncoder;
pub use traits::Encoder;
pub use types::{
    playlist_file_name, segment_file_pattern, RenditionArtifact, SegmentName,
    PLAYLIST_EXTENSION, SEGMENT_EXTENSION,
};
pub(crate) use types::file_name_of;
