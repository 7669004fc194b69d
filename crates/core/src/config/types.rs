use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::codec::EncoderConfig;
use crate::ladder::{LadderPreset, PlanError, RenditionPlan, TierDefinition};
use crate::storage::StorageConfig;
use crate::transcoder::TranscodeConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub ladder: LadderConfig,
    #[serde(default)]
    pub transcode: TranscodeConfig,
}

impl Config {
    /// Builds the rendition plan described by `[ladder]`.
    pub fn rendition_plan(&self) -> Result<RenditionPlan, PlanError> {
        self.ladder.plan()
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Rendition ladder configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LadderConfig {
    #[serde(default)]
    pub preset: LadderPreset,
    #[serde(default = "default_segment_duration")]
    pub segment_duration_secs: u32,
    /// Explicit tiers in ascending quality order; replaces the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiers: Option<Vec<TierDefinition>>,
}

fn default_segment_duration() -> u32 {
    6
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            preset: LadderPreset::default(),
            segment_duration_secs: default_segment_duration(),
            tiers: None,
        }
    }
}

impl LadderConfig {
    pub fn plan(&self) -> Result<RenditionPlan, PlanError> {
        match &self.tiers {
            Some(tiers) => RenditionPlan::new(tiers.clone(), self.segment_duration_secs),
            None => RenditionPlan::from_preset(self.preset, self.segment_duration_secs),
        }
    }
}
