//! # Metrics
//!
//! Prometheus metrics for monitoring the operator.
//!
//! ## Metrics Exposed
//!
//! - `patterns_operator_reconciliations_total` - Total number of reconciliations
//! - `patterns_operator_reconciliation_errors_total` - Total number of reconciliation errors
//! - `patterns_operator_reconciliation_duration_seconds` - Duration of reconciliation operations
//! - `patterns_operator_requeues_total` - Requeues by reason
//! - `patterns_operator_drift_checks_total` - Drift checks by result (`in_sync`, `drifted`, `error`)
//! - `patterns_operator_drift_check_duration_seconds` - Duration of drift checks
//! - `patterns_operator_drift_watched_patterns` - Patterns currently watched for drift
//! - `patterns_operator_condition_write_failures_total` - Failed drift condition writes

use anyhow::Result;
use prometheus::{Histogram, HistogramVec, IntCounter, IntCounterVec, IntGauge, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "patterns_operator_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "patterns_operator_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "patterns_operator_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "patterns_operator_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static DRIFT_CHECKS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "patterns_operator_drift_checks_total",
            "Total number of git drift checks by result",
        ),
        &["result"],
    )
    .expect("Failed to create DRIFT_CHECKS_TOTAL metric - this should never happen")
});

static DRIFT_CHECK_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "patterns_operator_drift_check_duration_seconds",
            "Duration of git drift checks in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 120.0]),
        &["result"],
    )
    .expect("Failed to create DRIFT_CHECK_DURATION metric - this should never happen")
});

static DRIFT_WATCHED_PATTERNS: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "patterns_operator_drift_watched_patterns",
        "Current number of patterns watched for git drift",
    )
    .expect("Failed to create DRIFT_WATCHED_PATTERNS metric - this should never happen")
});

static CONDITION_WRITE_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "patterns_operator_condition_write_failures_total",
        "Total number of failed git drift condition writes",
    )
    .expect("Failed to create CONDITION_WRITE_FAILURES_TOTAL metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DRIFT_CHECKS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DRIFT_CHECK_DURATION.clone()))?;
    REGISTRY.register(Box::new(DRIFT_WATCHED_PATTERNS.clone()))?;
    REGISTRY.register(Box::new(CONDITION_WRITE_FAILURES_TOTAL.clone()))?;

    Ok(())
}

/// Metric families currently registered
pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    REGISTRY.gather()
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

/// Count one drift check and its duration under `result`
pub fn record_drift_check(result: &str, duration: f64) {
    DRIFT_CHECKS_TOTAL.with_label_values(&[result]).inc();
    DRIFT_CHECK_DURATION
        .with_label_values(&[result])
        .observe(duration);
}

pub fn set_watched_pairs(count: usize) {
    DRIFT_WATCHED_PATTERNS.set(i64::try_from(count).unwrap_or(i64::MAX));
}

pub fn increment_condition_write_failures() {
    CONDITION_WRITE_FAILURES_TOTAL.inc();
}
