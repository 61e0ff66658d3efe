//! # Drift Watch Membership
//!
//! Keeps the drift watcher's set of Patterns in line with each Pattern's git
//! configuration.

use crate::crd::GitConfig;
use crate::drift::{DriftWatcher, WatchError};

/// What reconciling a Pattern did to its drift watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftWatchStep {
    Added,
    Updated,
    Removed,
    NotWatched,
}

impl DriftWatchStep {
    /// Reconcile step name reported in `status.lastStep`
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "add pattern to git drift watcher",
            Self::Updated => "update the watch interval to git drift watcher",
            Self::Removed => "remove pattern from git drift watcher",
            Self::NotWatched => "git drift watch not configured",
        }
    }
}

/// Add, update or remove a Pattern's drift watch.
///
/// On failure the step that was attempted is returned alongside the error.
pub fn sync_drift_watch(
    watcher: &DriftWatcher,
    name: &str,
    namespace: &str,
    git: &GitConfig,
) -> Result<DriftWatchStep, (DriftWatchStep, WatchError)> {
    let watching = watcher.is_watching(name, namespace);

    let (step, outcome) = if git.qualifies_for_drift_watch() {
        if watching {
            let outcome = watcher.update_interval(name, namespace, git.poll_interval);
            (DriftWatchStep::Updated, outcome)
        } else {
            let outcome = watcher.add(name, namespace, git.poll_interval);
            (DriftWatchStep::Added, outcome)
        }
    } else if watching {
        (DriftWatchStep::Removed, watcher.remove(name, namespace))
    } else {
        return Ok(DriftWatchStep::NotWatched);
    };

    outcome.map(|()| step).map_err(|e| (step, e))
}
