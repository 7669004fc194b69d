//! Types for the rendition ladder.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// One quality tier of the adaptive ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionSpec {
    /// Tier name, e.g. "480p". Used in every output filename.
    pub name: String,
    /// Target frame width in pixels.
    pub width: u32,
    /// Target frame height in pixels.
    pub height: u32,
    /// Video bitrate ceiling in kbit/s.
    pub video_bitrate_kbps: u32,
    /// Rate-control buffer size in kbit.
    pub buffer_size_kbits: u32,
    /// Audio bitrate in kbit/s.
    pub audio_bitrate_kbps: u32,
    /// Constant-quality factor (lower = better).
    pub crf: u8,
    /// Segment duration in seconds, identical for every tier of a plan.
    pub segment_duration_secs: u32,
}

impl RenditionSpec {
    /// Advertised bandwidth in bits/sec: video ceiling plus audio bitrate.
    ///
    /// Derived from the tier definition rather than measured from the encode so that
    /// manifests stay byte-identical across runs.
    pub fn bandwidth_bps(&self) -> u64 {
        (self.video_bitrate_kbps as u64 + self.audio_bitrate_kbps as u64) * 1000
    }

    /// Resolution as `WxH`.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// A tier definition without the plan-wide segment duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDefinition {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub video_bitrate_kbps: u32,
    pub buffer_size_kbits: u32,
    pub audio_bitrate_kbps: u32,
    pub crf: u8,
}

impl TierDefinition {
    pub fn new(
        name: &str,
        (width, height): (u32, u32),
        video_bitrate_kbps: u32,
        buffer_size_kbits: u32,
        audio_bitrate_kbps: u32,
        crf: u8,
    ) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            video_bitrate_kbps,
            buffer_size_kbits,
            audio_bitrate_kbps,
            crf,
        }
    }

    fn into_spec(self, segment_duration_secs: u32) -> RenditionSpec {
        RenditionSpec {
            name: self.name,
            width: self.width,
            height: self.height,
            video_bitrate_kbps: self.video_bitrate_kbps,
            buffer_size_kbits: self.buffer_size_kbits,
            audio_bitrate_kbps: self.audio_bitrate_kbps,
            crf: self.crf,
            segment_duration_secs,
        }
    }
}

/// Built-in ladders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LadderPreset {
    /// 480p, 720p, 1080p.
    #[default]
    Standard,
    /// 144p through 1080p in six steps.
    Extended,
}

impl LadderPreset {
    /// Tier definitions in ascending quality order.
    pub fn tiers(&self) -> Vec<TierDefinition> {
        let standard = [
            TierDefinition::new("480p", (854, 480), 1000, 2000, 128, 23),
            TierDefinition::new("720p", (1280, 720), 2500, 5000, 128, 21),
            TierDefinition::new("1080p", (1920, 1080), 5000, 10000, 192, 20),
        ];
        match self {
            Self::Standard => standard.to_vec(),
            Self::Extended => {
                let mut tiers = vec![
                    TierDefinition::new("144p", (256, 144), 200, 400, 64, 28),
                    TierDefinition::new("240p", (426, 240), 400, 800, 64, 26),
                    TierDefinition::new("360p", (640, 360), 700, 1400, 96, 24),
                ];
                tiers.extend(standard);
                tiers
            }
        }
    }
}

/// Errors raised when a plan violates the ladder invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("rendition plan has no tiers")]
    Empty,

    #[error("duplicate tier name: {0}")]
    DuplicateTier(String),

    #[error("invalid tier name {0:?}: only ASCII letters and digits are allowed")]
    InvalidTierName(String),

    #[error("tier {tier}: {reason}")]
    InvalidTier { tier: String, reason: String },

    #[error("segment duration must be positive")]
    ZeroSegmentDuration,
}

/// The ordered, immutable set of renditions produced for every source.
///
/// Order is ascending quality; players pick the first viable entry of the
/// master manifest, so the order is part of the output contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenditionPlan {
    tiers: Vec<RenditionSpec>,
}

impl RenditionPlan {
    /// Builds a plan, checking every ladder invariant.
    pub fn new(
        definitions: Vec<TierDefinition>,
        segment_duration_secs: u32,
    ) -> Result<Self, PlanError> {
        if definitions.is_empty() {
            return Err(PlanError::Empty);
        }
        if segment_duration_secs == 0 {
            return Err(PlanError::ZeroSegmentDuration);
        }

        let mut seen = HashSet::new();
        for def in &definitions {
            if def.name.is_empty() || !def.name.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(PlanError::InvalidTierName(def.name.clone()));
            }
            if !seen.insert(def.name.to_ascii_lowercase()) {
                return Err(PlanError::DuplicateTier(def.name.clone()));
            }
            validate_tier(def)?;
        }

        Ok(Self {
            tiers: definitions
                .into_iter()
                .map(|d| d.into_spec(segment_duration_secs))
                .collect(),
        })
    }

    /// Builds the plan for a built-in preset.
    pub fn from_preset(preset: LadderPreset, segment_duration_secs: u32) -> Result<Self, PlanError> {
        Self::new(preset.tiers(), segment_duration_secs)
    }

    /// The canonical three-tier plan with 6 second segments.
    pub fn standard() -> Self {
        Self {
            tiers: LadderPreset::Standard
                .tiers()
                .into_iter()
                .map(|d| d.into_spec(6))
                .collect(),
        }
    }

    /// Tiers in encode and manifest order.
    pub fn tiers(&self) -> &[RenditionSpec] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Looks up a tier by name.
    pub fn get(&self, name: &str) -> Option<&RenditionSpec> {
        self.tiers.iter().find(|t| t.name == name)
    }

    pub fn segment_duration_secs(&self) -> u32 {
        self.tiers
            .first()
            .map(|t| t.segment_duration_secs)
            .unwrap_or_default()
    }
}

fn validate_tier(def: &TierDefinition) -> Result<(), PlanError> {
    let invalid = |reason: &str| PlanError::InvalidTier {
        tier: def.name.clone(),
        reason: reason.to_string(),
    };

    if def.width == 0 || def.height == 0 {
        return Err(invalid("width and height must be positive"));
    }
    // yuv420p needs even dimensions
    if def.width % 2 != 0 || def.height % 2 != 0 {
        return Err(invalid("width and height must be even"));
    }
    if def.video_bitrate_kbps == 0 || def.audio_bitrate_kbps == 0 {
        return Err(invalid("bitrates must be positive"));
    }
    if def.buffer_size_kbits == 0 {
        return Err(invalid("buffer size must be positive"));
    }
    if def.crf > 51 {
        return Err(invalid("crf must be in 0..=51"));
    }
    Ok(())
}
