//! Prometheus metrics for core components.
//!
//! Collectors are process-wide statics; the server registers them through
//! [`all_metrics`].

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Orchestrator - Run Metrics
// =============================================================================

/// Runs total by result.
pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("hlsforge_runs_total", "Total orchestration runs"),
        &["result"], // "success", or the failure kind
    )
    .unwrap()
});

/// Run duration in seconds.
pub static RUN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "hlsforge_run_duration_seconds",
            "Wall-clock duration of orchestration runs",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 900.0]),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Cleanup failures absorbed by runs.
pub static CLEANUP_WARNINGS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "hlsforge_cleanup_warnings_total",
        "Scratch workspaces that could not be removed",
    )
    .unwrap()
});

// =============================================================================
// Codec Metrics
// =============================================================================

/// Tier encodes total by tier and result.
pub static RENDITIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("hlsforge_renditions_total", "Total tier encodes"),
        &["tier", "result"], // result: "success", "failed"
    )
    .unwrap()
});

/// Tier encode duration in seconds.
pub static RENDITION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "hlsforge_rendition_duration_seconds",
            "Duration of a single tier encode",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["tier"],
    )
    .unwrap()
});

// =============================================================================
// Storage Metrics
// =============================================================================

/// Objects uploaded total.
pub static OBJECTS_UPLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("hlsforge_objects_uploaded_total", "Total objects uploaded").unwrap()
});

/// Bytes uploaded total.
pub static BYTES_UPLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("hlsforge_bytes_uploaded_total", "Total bytes uploaded").unwrap()
});

// =============================================================================
// Trigger Metrics
// =============================================================================

/// Notification records skipped by reason.
pub static RECORDS_SKIPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "hlsforge_records_skipped_total",
            "Notification records not processed",
        ),
        &["reason"], // "unsupported_suffix", "unsupported_event", "invalid_key"
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Runs
        Box::new(RUNS_TOTAL.clone()),
        Box::new(RUN_DURATION.clone()),
        Box::new(CLEANUP_WARNINGS.clone()),
        // Codec
        Box::new(RENDITIONS_TOTAL.clone()),
        Box::new(RENDITION_DURATION.clone()),
        // Storage
        Box::new(OBJECTS_UPLOADED.clone()),
        Box::new(BYTES_UPLOADED.clone()),
        // Trigger
        Box::new(RECORDS_SKIPPED.clone()),
    ]
}
