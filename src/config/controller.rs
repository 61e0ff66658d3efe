//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use super::{env_var_or_default, env_var_or_default_str};
use crate::constants::{
    DEFAULT_BACKOFF_MAX_MS, DEFAULT_BACKOFF_START_MS, DEFAULT_DELETION_REQUEUE_SECS,
    DEFAULT_DRIFT_CHECK_TIMEOUT_SECS, DEFAULT_GIT_BINARY, DEFAULT_RECONCILE_INTERVAL_SECS,
    DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS, DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
    DEFAULT_WATCH_RESTART_DELAY_SECS, MIN_POLL_INTERVAL_SECS,
};
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Reconciliation error requeue interval (seconds)
    pub reconciliation_error_requeue_secs: u64,
    /// Requeue interval after a successful reconciliation (seconds)
    pub reconcile_interval_secs: u64,
    /// Requeue interval while a Pattern is being deleted (seconds)
    pub deletion_requeue_secs: u64,
    /// Smallest accepted drift poll interval (seconds)
    /// Non-negative `pollInterval` values below this are raised to it
    pub min_poll_interval_secs: i64,
    /// Upper bound on one drift check (seconds), 0 for no bound
    pub drift_check_timeout_secs: u64,
    /// Exponential backoff starting value (milliseconds)
    /// Initial delay before restarting the watch after API throttling
    pub backoff_start_ms: u64,
    /// Exponential backoff maximum value (milliseconds)
    pub backoff_max_ms: u64,
    /// Watch stream restart delay after unknown errors (seconds)
    pub watch_restart_delay_secs: u64,
    /// Watch stream restart delay after stream ends (seconds)
    pub watch_restart_delay_after_end_secs: u64,
    /// git binary used for `git ls-remote`
    pub git_binary: String,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            reconciliation_error_requeue_secs: DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            reconcile_interval_secs: DEFAULT_RECONCILE_INTERVAL_SECS,
            deletion_requeue_secs: DEFAULT_DELETION_REQUEUE_SECS,
            min_poll_interval_secs: MIN_POLL_INTERVAL_SECS,
            drift_check_timeout_secs: DEFAULT_DRIFT_CHECK_TIMEOUT_SECS,
            backoff_start_ms: DEFAULT_BACKOFF_START_MS,
            backoff_max_ms: DEFAULT_BACKOFF_MAX_MS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            watch_restart_delay_after_end_secs: DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            git_binary: DEFAULT_GIT_BINARY.to_string(),
            log_level: "INFO".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            reconciliation_error_requeue_secs: env_var_or_default(
                "RECONCILIATION_ERROR_REQUEUE_SECS",
                DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            ),
            reconcile_interval_secs: env_var_or_default(
                "RECONCILE_INTERVAL_SECS",
                DEFAULT_RECONCILE_INTERVAL_SECS,
            ),
            deletion_requeue_secs: env_var_or_default(
                "DELETION_REQUEUE_SECS",
                DEFAULT_DELETION_REQUEUE_SECS,
            ),
            min_poll_interval_secs: env_var_or_default(
                "MIN_POLL_INTERVAL_SECS",
                MIN_POLL_INTERVAL_SECS,
            ),
            drift_check_timeout_secs: env_var_or_default(
                "DRIFT_CHECK_TIMEOUT_SECS",
                DEFAULT_DRIFT_CHECK_TIMEOUT_SECS,
            ),
            backoff_start_ms: env_var_or_default("BACKOFF_START_MS", DEFAULT_BACKOFF_START_MS),
            backoff_max_ms: env_var_or_default("BACKOFF_MAX_MS", DEFAULT_BACKOFF_MAX_MS),
            watch_restart_delay_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            watch_restart_delay_after_end_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_AFTER_END_SECS",
                DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            ),
            git_binary: env_var_or_default_str("GIT_BINARY", DEFAULT_GIT_BINARY),
            log_level: env_var_or_default_str("LOG_LEVEL", "INFO"),
        }
    }

    #[must_use]
    pub fn reconciliation_error_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.reconciliation_error_requeue_secs)
    }

    #[must_use]
    pub fn reconcile_interval_duration(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }

    #[must_use]
    pub fn deletion_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.deletion_requeue_secs)
    }

    /// `None` when drift checks are unbounded
    #[must_use]
    pub fn drift_check_timeout(&self) -> Option<Duration> {
        (self.drift_check_timeout_secs > 0).then(|| Duration::from_secs(self.drift_check_timeout_secs))
    }

    #[must_use]
    pub fn watch_restart_delay_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }

    #[must_use]
    pub fn watch_restart_delay_after_end_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_after_end_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.min_poll_interval_secs, 180);
        assert_eq!(config.reconcile_interval_duration(), Duration::from_secs(180));
        assert_eq!(config.drift_check_timeout(), Some(Duration::from_secs(120)));
        assert_eq!(config.git_binary, "git");
    }

    #[test]
    fn test_duration_accessors() {
        let config = ControllerConfig {
            reconciliation_error_requeue_secs: 45,
            watch_restart_delay_secs: 7,
            watch_restart_delay_after_end_secs: 3,
            ..ControllerConfig::default()
        };
        assert_eq!(config.reconciliation_error_requeue_duration(), Duration::from_secs(45));
        assert_eq!(config.watch_restart_delay_duration(), Duration::from_secs(7));
        assert_eq!(config.watch_restart_delay_after_end_duration(), Duration::from_secs(3));
    }

    #[test]
    fn test_zero_timeout_is_unbounded() {
        let config = ControllerConfig {
            drift_check_timeout_secs: 0,
            ..ControllerConfig::default()
        };
        assert_eq!(config.drift_check_timeout(), None);
    }
}
