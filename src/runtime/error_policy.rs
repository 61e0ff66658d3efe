//! # Error Policy
//!
//! Backoff for failed reconciliations and classification of watch stream errors.

use crate::constants::{DEFAULT_DELETION_REQUEUE_SECS, DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS};
use crate::controller::reconciler::{BackoffState, Reconciler, ReconcilerError};
use crate::crd::Pattern;
use crate::observability;
use kube_runtime::controller::Action;
use kube::ResourceExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Requeue a failed Pattern.
///
/// Patterns being deleted retry on the fixed deletion interval. Everything else
/// follows a Fibonacci backoff tracked per `namespace/name`.
pub fn handle_reconciliation_error(
    pattern: Arc<Pattern>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = pattern.name_any();
    let namespace = pattern.namespace().unwrap_or_default();

    let error_span = tracing::error_span!(
        "controller.watch.reconciliation_error",
        pattern.name = name.as_str(),
        pattern.namespace = namespace.as_str()
    );
    let _guard = error_span.enter();

    error!(error = %error, "reconciliation failed");
    observability::metrics::increment_reconciliation_errors();

    if pattern.metadata.deletion_timestamp.is_some() {
        let delay = ctx.config.try_read().map_or(
            Duration::from_secs(DEFAULT_DELETION_REQUEUE_SECS),
            |config| config.deletion_requeue_duration(),
        );
        info!("retrying finalization in {}s", delay.as_secs());
        observability::metrics::increment_requeues_total("deletion");
        return Action::requeue(delay);
    }

    let resource_key = format!("{namespace}/{name}");
    let (delay, error_count) = match ctx.backoff_states.lock() {
        Ok(mut states) => {
            let state = states.entry(resource_key).or_insert_with(BackoffState::default);
            state.increment_error();
            (state.backoff.next_backoff(), state.error_count)
        }
        Err(e) => {
            warn!("Failed to lock backoff_states: {}, using default requeue", e);
            let fallback = ctx.config.try_read().map_or(
                Duration::from_secs(DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS),
                |config| config.reconciliation_error_requeue_duration(),
            );
            (fallback, 0)
        }
    };

    info!(
        "retrying with Fibonacci backoff: {}s (error count: {})",
        delay.as_secs(),
        error_count
    );
    observability::metrics::increment_requeues_total("error-backoff");
    Action::requeue(delay)
}

/// How the watch loop should treat a controller stream error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorKind {
    Unauthorized,
    Expired,
    Throttled,
    NotFound,
    Other,
}

impl WatchErrorKind {
    /// Classify a rendered controller error. 404 is checked before 401 since
    /// plain-text 404 bodies surface inside `WatchFailed` errors.
    #[must_use]
    pub fn classify(error: &str) -> Self {
        let not_found =
            error.contains("ObjectNotFound") || error.contains("404") || error.contains("not found");
        if not_found {
            return Self::NotFound;
        }
        if error.contains("401") || error.contains("Unauthorized") {
            Self::Unauthorized
        } else if error.contains("410")
            || error.contains("too old resource version")
            || error.contains("Expired")
            || error.contains("Gone")
        {
            Self::Expired
        } else if error.contains("429")
            || error.contains("storage is (re)initializing")
            || error.contains("TooManyRequests")
        {
            Self::Throttled
        } else {
            Self::Other
        }
    }
}

/// Handle a controller stream error.
///
/// Returns `None` to drop the event and let the watch restart, `Some(())` to keep it.
pub async fn handle_watch_stream_error(
    error_string: &str,
    backoff: &Arc<AtomicU64>,
    max_backoff_ms: u64,
    watch_restart_delay: Duration,
) -> Option<()> {
    match WatchErrorKind::classify(error_string) {
        WatchErrorKind::Unauthorized => {
            error!(
                "watch authentication failed (401 Unauthorized), check the operator's ClusterRole and ServiceAccount token"
            );
            warn!(
                "waiting {}s before retrying watch",
                watch_restart_delay.as_secs()
            );
            tokio::time::sleep(watch_restart_delay).await;
            None
        }
        WatchErrorKind::Expired => {
            warn!(error_type = "410", "watch resource version expired, watch will restart");
            None
        }
        WatchErrorKind::Throttled => {
            let current = backoff.load(Ordering::Relaxed);
            warn!(
                "API server throttling (429), backing off for {}ms before restart",
                current
            );
            tokio::time::sleep(Duration::from_millis(current)).await;
            backoff.store(current.saturating_mul(2).min(max_backoff_ms), Ordering::Relaxed);
            None
        }
        WatchErrorKind::NotFound => {
            warn!(
                "Pattern or its CRD not found (404), this is expected after deletion. Error: {}",
                error_string
            );
            Some(())
        }
        WatchErrorKind::Other => {
            error!("Controller stream error: {}", error_string);
            tokio::time::sleep(watch_restart_delay).await;
            None
        }
    }
}
