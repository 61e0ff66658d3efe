//! # Types
//!
//! Core types for the reconciler.

use crate::config::SharedControllerConfig;
use crate::constants::{RECONCILE_BACKOFF_MAX_MINUTES, RECONCILE_BACKOFF_MIN_MINUTES};
use crate::controller::backoff::FibonacciBackoff;
use crate::drift::{DriftWatcher, WatchError};
use crate::git::UrlError;
use kube::Client;
use kube_runtime::finalizer;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("Pattern is missing metadata.{0}")]
    MissingMetadata(&'static str),
    #[error(transparent)]
    InvalidRepository(#[from] UrlError),
    #[error(transparent)]
    DriftWatch(#[from] WatchError),
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
    #[error("finalizer failed: {0}")]
    Finalizer(#[source] Box<finalizer::Error<ReconcilerError>>),
}

/// Backoff state for a specific Pattern
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl Default for BackoffState {
    fn default() -> Self {
        Self {
            backoff: FibonacciBackoff::new(
                RECONCILE_BACKOFF_MIN_MINUTES,
                RECONCILE_BACKOFF_MAX_MINUTES,
            ),
            error_count: 0,
        }
    }
}

impl BackoffState {
    pub fn increment_error(&mut self) {
        self.error_count += 1;
    }

    pub fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Shared reconciliation context
#[derive(Clone)]
pub struct Reconciler {
    pub client: Client,
    pub drift_watcher: DriftWatcher,
    pub config: SharedControllerConfig,
    // Keyed by namespace/name; written by the error policy, cleared on success
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("drift_watcher", &self.drift_watcher)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(client: Client, drift_watcher: DriftWatcher, config: SharedControllerConfig) -> Self {
        Self {
            client,
            drift_watcher,
            config,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Clear the error backoff for a Pattern. Returns whether it had failed before.
    pub fn reset_backoff(&self, resource_key: &str) -> bool {
        let Ok(mut states) = self.backoff_states.lock() else {
            return false;
        };
        states.get_mut(resource_key).is_some_and(|state| {
            let had_errors = state.error_count > 0;
            state.reset();
            had_errors
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_state_reset() {
        let mut state = BackoffState::default();
        state.increment_error();
        state.increment_error();
        assert_eq!(state.backoff.next_backoff_seconds(), 60);
        assert_eq!(state.backoff.next_backoff_seconds(), 60);
        assert_eq!(state.error_count, 2);

        state.reset();
        assert_eq!(state.error_count, 0);
        assert_eq!(state.backoff.next_backoff_seconds(), 60);
    }

    #[test]
    fn test_watch_error_passes_through() {
        let err = ReconcilerError::from(WatchError::NotStarted);
        assert_eq!(err.to_string(), "the git drift watcher has not been started");
    }
}
