pub mod codec;
pub mod config;
pub mod ladder;
pub mod manifest;
pub mod metrics;
pub mod storage;
pub mod testing;
pub mod transcoder;
pub mod trigger;

pub use codec::{CodecError, Encoder, EncoderConfig, FfmpegEncoder, RenditionArtifact};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LogFormat,
};
pub use ladder::{LadderPreset, PlanError, RenditionPlan, RenditionSpec, TierDefinition};
pub use manifest::{ManifestBuilder, ManifestError, MasterManifest};
pub use storage::{
    create_storage, LocalStorage, ObjectMetadata, ObjectStorage, S3Storage, StorageConfig,
    StorageError,
};
pub use transcoder::{
    ProcessingResult, RunProgress, RunStage, SourceReference, TranscodeConfig, TranscodeError,
    TranscodeOrchestrator,
};
pub use trigger::{BatchReport, SkipReason, SkippedRecord, TriggerAdapter, TriggerEvent};
