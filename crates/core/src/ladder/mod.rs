//! Rendition ladder: the fixed table of quality tiers every source is encoded to.
//!
//! A [`RenditionPlan`] is built once at start-up (from a preset or an explicit
//! tier list) and shared read-only by every orchestration.

mod types;

pub use types::{LadderPreset, PlanError, RenditionPlan, RenditionSpec, TierDefinition};
