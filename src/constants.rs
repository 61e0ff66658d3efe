//! # Constants
//!
//! Shared constants used throughout the operator.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default requeue interval for reconciliation errors (seconds)
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 60;

/// Requeue interval after a successful reconciliation (seconds)
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 180;

/// Requeue interval while a Pattern is being deleted (seconds)
pub const DEFAULT_DELETION_REQUEUE_SECS: u64 = 120;

/// Default exponential backoff starting value (milliseconds)
pub const DEFAULT_BACKOFF_START_MS: u64 = 1000;

/// Default exponential backoff maximum value (milliseconds)
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 30_000;

/// Default delay before restarting watch stream after unknown errors (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default delay before restarting watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS: u64 = 1;

/// Minimum git drift poll interval (seconds).
/// Smaller non-negative `pollInterval` values are raised to this.
pub const MIN_POLL_INTERVAL_SECS: i64 = 180;

/// `pollInterval` value that turns drift watching off
pub const POLL_INTERVAL_DISABLED: i64 = -1;

/// Upper bound on a single drift check (seconds). 0 means unbounded.
pub const DEFAULT_DRIFT_CHECK_TIMEOUT_SECS: u64 = 120;

/// Fibonacci backoff bounds for failed reconciliations (minutes)
pub const RECONCILE_BACKOFF_MIN_MINUTES: u64 = 1;
pub const RECONCILE_BACKOFF_MAX_MINUTES: u64 = 10;

/// git binary used to list remote references
pub const DEFAULT_GIT_BINARY: &str = "git";
