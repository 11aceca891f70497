//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Workflow stages (runs started, terminal outcomes)
//! - Mapping server calls (latency by operation)
//! - Artifact downloads

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Workflow Stage Metrics
// =============================================================================

/// Stage runs started by stage.
pub static STAGE_RUNS_STARTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "rationalizer_stage_runs_started_total",
            "Total workflow stage runs started",
        ),
        &["stage"], // "upload", "taxonomy", "gartner"
    )
    .unwrap()
});

/// Stage runs settled by stage and result.
pub static STAGE_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "rationalizer_stage_outcomes_total",
            "Total workflow stage runs reaching a terminal state",
        ),
        &["stage", "result"], // "completed", "failed", "timed_out"
    )
    .unwrap()
});

// =============================================================================
// Mapping Server Metrics
// =============================================================================

/// Mapping server call duration in seconds.
pub static REMOTE_CALL_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "rationalizer_remote_call_duration_seconds",
            "Duration of mapping server calls",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["operation", "result"],
    )
    .unwrap()
});

// =============================================================================
// Artifact Metrics
// =============================================================================

/// Artifact downloads by kind and result.
pub static ARTIFACT_DOWNLOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "rationalizer_artifact_downloads_total",
            "Total report artifact downloads",
        ),
        &["kind", "result"], // "ppt"/"excel", "success"/"failed"
    )
    .unwrap()
});

/// All core metrics, for registration by the host binary.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(STAGE_RUNS_STARTED.clone()),
        Box::new(STAGE_OUTCOMES.clone()),
        Box::new(REMOTE_CALL_DURATION.clone()),
        Box::new(ARTIFACT_DOWNLOADS.clone()),
    ]
}
