//! Transcoder module: the state machine turning one source object into a
//! published adaptive-streaming set.
//!
//! A run moves through `Fetching → Encoding(1..N) → Manifesting → Pushing →
//! CleaningUp → Done`. Any failure jumps straight to cleanup. Tiers are encoded
//! one at a time in ladder order, and nothing is uploaded unless every tier
//! and the master playlist were produced. Outputs are written next to the
//! source:
//!
//! ```text
//! {dir}/{base}.m3u8
//! {dir}/{base}_{tier}.m3u8
//! {dir}/{base}_{tier}_{NNN}.ts
//! ```
//!
//! Objects pushed before a failed upload are left in place; they are not
//! referenced by any published master playlist.

mod config;
mod error;
mod orchestrator;
mod types;
mod workspace;

pub use config::TranscodeConfig;
pub use error::TranscodeError;
pub use orchestrator::TranscodeOrchestrator;
pub use types::{ProcessingResult, RunProgress, RunStage, SourceReference};
pub use workspace::ScratchWorkspace;
