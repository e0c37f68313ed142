//! Observability module for logging setup, spans and search metrics.
//!
//! This module provides:
//! - Structured logging with configurable levels and formats
//! - Spans for the search and its method-group workers
//! - Metrics through the `metrics` facade (a no-op until the host installs a recorder)

use anyhow::Result;
use tracing_subscriber::prelude::*;

use crate::observability_config::{LogFormat, ObservabilityConfig};

/// Initialize structured logging with tracing and configuration
pub fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("scan_sweep={}", config.log_level.to_lowercase()).parse()?)
        .add_directive(format!("search={}", config.log_level.to_lowercase()).parse()?)
        .add_directive(format!("preprocessing={}", config.log_level.to_lowercase()).parse()?);

    match config.effective_format() {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_thread_names(false),
                )
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_thread_names(true),
                )
                .try_init()?;
        }
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Create a span for a whole best-image search
pub fn search_span(mode: &str, total_candidates: usize) -> tracing::Span {
    tracing::info_span!(
        "best_image_search",
        mode = mode,
        total_candidates = total_candidates,
        component = "search"
    )
}

/// Create a span for one method-group sweep
pub fn group_span(group: &str, candidates: usize) -> tracing::Span {
    tracing::info_span!(
        "method_group",
        group = group,
        candidates = candidates,
        component = "search"
    )
}

/// Create a span for OCR operations
pub fn ocr_span(operation: &str) -> tracing::Span {
    tracing::debug_span!("ocr_operation", operation = operation, component = "ocr")
}

/// Record a candidate that was transformed and OCR'd, whether or not it was eligible
pub fn record_candidate_evaluated(method: &'static str) {
    metrics::counter!("search_candidates_evaluated_total", "method" => method).increment(1);
}

/// Record a candidate that produced a result but was not eligible
pub fn record_candidate_rejected(reason: &'static str) {
    metrics::counter!("search_candidates_rejected_total", "reason" => reason).increment(1);
}

/// Record a candidate whose transform or OCR call failed or panicked
pub fn record_candidate_failure(stage: &'static str) {
    metrics::counter!("search_candidate_failures_total", "stage" => stage).increment(1);
}

/// Record a replacement of the current best result
pub fn record_registry_update() {
    metrics::counter!("search_registry_updates_total").increment(1);
}

/// Record a finished search.
///
/// `result` is `found`, `not_found` or `no_text`; `execution` is `parallel`,
/// `sequential`, or `skipped` when the search stopped before dispatch.
pub fn record_search_metrics(
    result: &'static str,
    execution: &'static str,
    duration: std::time::Duration,
) {
    metrics::counter!(
        "search_runs_total",
        "result" => result,
        "execution" => execution
    )
    .increment(1);
    metrics::histogram!("search_duration_seconds").record(duration.as_secs_f64());
}

/// Record OCR operation metrics
pub fn record_ocr_metrics(operation: &'static str, success: bool, duration: std::time::Duration) {
    metrics::counter!(
        "ocr_operations_total",
        "operation" => operation,
        "result" => if success { "success" } else { "failure" }
    )
    .increment(1);
    metrics::histogram!("ocr_duration_seconds", "operation" => operation)
        .record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_metrics_without_recorder_are_noops() {
        record_candidate_evaluated("binary_threshold");
        record_candidate_rejected("below_retention");
        record_candidate_failure("ocr");
        record_registry_update();
        record_search_metrics("found", "sequential", Duration::from_millis(5));
        record_ocr_metrics("ocr_text", false, Duration::from_millis(1));
    }

    #[test]
    fn test_invalid_log_level_is_rejected() {
        let config = ObservabilityConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert!(init_tracing_with_config(&config).is_err());
    }
}
