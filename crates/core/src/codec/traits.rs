//! Trait definitions for the codec module.

use async_trait::async_trait;
use std::path::Path;

use super::error::CodecError;
use super::types::RenditionArtifact;
use crate::ladder::RenditionSpec;

/// An encoder that turns one input file into one segmented rendition.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    /// Encodes `input` into `output_dir` for a single tier.
    ///
    /// Writes `{base_name}_{tier}.m3u8` and `{base_name}_{tier}_NNN.ts` under
    /// `output_dir` only; the input file is never modified.
    async fn produce(
        &self,
        input: &Path,
        output_dir: &Path,
        base_name: &str,
        rendition: &RenditionSpec,
    ) -> Result<RenditionArtifact, CodecError>;

    /// Validates that the encoder is properly configured and ready.
    async fn validate(&self) -> Result<(), CodecError>;
}
