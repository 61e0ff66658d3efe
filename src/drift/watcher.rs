//! # Drift Watcher
//!
//! Polls every watched Pattern on its own interval and records the result as a
//! git-sync condition.
//!
//! A single background task owns the timer. It sleeps until the head of the
//! [`RepositoryPairQueue`] is due, runs that pair's drift check, reschedules
//! it and goes back to sleep. `add`, `remove` and `update_interval` mutate the
//! queue under the lock, bump a generation counter and wake the task so it can
//! re-arm against the new head. A timer armed under an older generation is
//! discarded when it fires.
//!
//! Checks never overlap: the task runs one at a time. Errors from a check are
//! logged and the pair is simply rescheduled.

use super::detector::{DriftDetector, DriftError};
use super::pair::{PatternKey, RepositoryPair, RepositoryPairQueue};
use super::store::PatternStore;
use crate::observability::metrics;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn, Instrument};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WatchError {
    #[error("the git drift watcher has not been started")]
    NotStarted,
    #[error("unable to find git remote pair for pattern {name} in namespace {namespace}")]
    NotFound { name: String, namespace: String },
    #[error("poll interval {0}s disables drift watching")]
    Disabled(i64),
}

/// Stops the watcher's background task when signalled
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Stop the background task. No drift check starts after this returns.
    pub fn shutdown(&self) {
        self.sender.send_replace(true);
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }
}

#[derive(Debug)]
struct RunningWatch {
    updates: mpsc::UnboundedSender<()>,
    shutdown: ShutdownHandle,
}

#[derive(Debug, Default)]
struct WatcherState {
    pairs: RepositoryPairQueue,
    generation: u64,
    running: Option<RunningWatch>,
}

impl WatcherState {
    fn running(&self) -> Result<&RunningWatch, WatchError> {
        self.running.as_ref().ok_or(WatchError::NotStarted)
    }

    /// Invalidate any armed timer and wake the background task
    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        metrics::set_watched_pairs(self.pairs.len());
        if let Some(running) = &self.running {
            // A closed channel means the task is exiting; nothing to wake
            let _ = running.updates.send(());
        }
    }
}

struct Shared {
    state: Mutex<WatcherState>,
    detector: DriftDetector,
    store: Arc<dyn PatternStore>,
    check_timeout: Option<Duration>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, WatcherState> {
        // The state stays consistent across a panic in another holder
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Schedules and runs drift checks for watched Patterns
#[derive(Clone)]
pub struct DriftWatcher {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for DriftWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("DriftWatcher")
            .field("pairs", &state.pairs.len())
            .field("running", &state.running.is_some())
            .field("check_timeout", &self.shared.check_timeout)
            .finish_non_exhaustive()
    }
}

impl DriftWatcher {
    /// Create a watcher. `check_timeout` bounds a single drift check; `None`
    /// lets a check run for as long as the remotes take.
    #[must_use]
    pub fn new(
        detector: DriftDetector,
        store: Arc<dyn PatternStore>,
        check_timeout: Option<Duration>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(WatcherState::default()),
                detector,
                store,
                check_timeout,
            }),
        }
    }

    /// Start the background task, or return the handle of the running one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn watch(&self) -> ShutdownHandle {
        let mut state = self.shared.lock();
        if let Some(running) = &state.running {
            return running.shutdown.clone();
        }

        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shutdown = ShutdownHandle {
            sender: Arc::new(shutdown_tx),
        };
        state.running = Some(RunningWatch {
            updates: updates_tx,
            shutdown: shutdown.clone(),
        });
        drop(state);

        let shared = Arc::clone(&self.shared);
        let span = tracing::info_span!("drift.watcher");
        tokio::spawn(run(shared, updates_rx, shutdown_rx).instrument(span));
        info!("git drift watcher started");
        shutdown
    }

    /// Start watching a Pattern, checking it every `interval_secs` seconds.
    ///
    /// Adding a Pattern that is already watched replaces its schedule.
    pub fn add(&self, name: &str, namespace: &str, interval_secs: i64) -> Result<(), WatchError> {
        let interval = interval_from_secs(interval_secs)?;
        let mut state = self.shared.lock();
        state.running()?;

        let key = PatternKey::new(name, namespace);
        if !state.pairs.upsert(key.clone(), interval, Instant::now()) {
            debug!(pattern = %key, "pattern already watched, schedule replaced");
        }
        state.touch();
        info!(pattern = %key, interval_secs, "watching pattern for git drift");
        Ok(())
    }

    /// Stop watching a Pattern. A check already running for it is not interrupted.
    pub fn remove(&self, name: &str, namespace: &str) -> Result<(), WatchError> {
        let mut state = self.shared.lock();
        state.running()?;

        let key = PatternKey::new(name, namespace);
        if state.pairs.remove(&key).is_none() {
            return Err(WatchError::NotFound {
                name: name.to_string(),
                namespace: namespace.to_string(),
            });
        }
        state.touch();
        info!(pattern = %key, "stopped watching pattern for git drift");
        Ok(())
    }

    /// Change a watched Pattern's interval; the next check is due
    /// `interval_secs` from now. Unchanged intervals leave the schedule alone
    /// and a negative interval stops watching.
    pub fn update_interval(
        &self,
        name: &str,
        namespace: &str,
        interval_secs: i64,
    ) -> Result<(), WatchError> {
        if interval_secs < 0 {
            return self.remove(name, namespace);
        }
        let interval = interval_from_secs(interval_secs)?;

        let mut state = self.shared.lock();
        state.running()?;

        let key = PatternKey::new(name, namespace);
        let current = state.pairs.get(&key).map(RepositoryPair::interval);
        match current {
            None => Err(WatchError::NotFound {
                name: name.to_string(),
                namespace: namespace.to_string(),
            }),
            Some(current) if current == interval => Ok(()),
            Some(_) => {
                state.pairs.upsert(key.clone(), interval, Instant::now());
                state.touch();
                info!(pattern = %key, interval_secs, "git drift poll interval updated");
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn is_watching(&self, name: &str, namespace: &str) -> bool {
        self.shared
            .lock()
            .pairs
            .contains(&PatternKey::new(name, namespace))
    }

    /// Watched Patterns in the order they are due
    #[must_use]
    pub fn watched(&self) -> Vec<PatternKey> {
        self.shared
            .lock()
            .pairs
            .iter()
            .map(|p| p.key().clone())
            .collect()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.lock().running.is_some()
    }
}

fn interval_from_secs(interval_secs: i64) -> Result<Duration, WatchError> {
    u64::try_from(interval_secs)
        .map(Duration::from_secs)
        .map_err(|_negative| WatchError::Disabled(interval_secs))
}

async fn run(
    shared: Arc<Shared>,
    mut updates: mpsc::UnboundedReceiver<()>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        let (deadline, generation) = {
            let state = shared.lock();
            (state.pairs.head().map(|p| p.next_check()), state.generation)
        };

        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            update = updates.recv() => {
                if update.is_none() {
                    break;
                }
            }
            () = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    () = fire(&shared, generation) => {}
                }
            }
        }
    }

    shared.lock().running = None;
    info!("git drift watcher stopped");
}

/// Check the head pair if the timer that fired is still current
async fn fire(shared: &Shared, generation: u64) {
    let key = {
        let state = shared.lock();
        if state.generation != generation {
            debug!("stale drift timer fired, re-arming");
            return;
        }
        match state.pairs.head() {
            Some(head) if head.next_check() <= Instant::now() => head.key().clone(),
            _ => return,
        }
    };

    let span = tracing::info_span!(
        "drift.check",
        pattern.name = %key.name,
        pattern.namespace = %key.namespace
    );
    check(shared, &key).instrument(span).await;

    let finished = Instant::now();
    shared.lock().pairs.complete_check(&key, finished);
}

async fn check(shared: &Shared, key: &PatternKey) {
    let started = std::time::Instant::now();
    let outcome = match shared.check_timeout {
        Some(limit) => tokio::time::timeout(limit, shared.detector.has_drifted(key))
            .await
            .unwrap_or_else(|_elapsed| Err(DriftError::Timeout(limit))),
        None => shared.detector.has_drifted(key).await,
    };
    let elapsed = started.elapsed().as_secs_f64();

    let drifted = match outcome {
        Ok(drifted) => drifted,
        Err(e) => {
            warn!(error = %e, "git drift check failed");
            metrics::record_drift_check("error", elapsed);
            return;
        }
    };

    let result = if drifted { "drifted" } else { "in_sync" };
    metrics::record_drift_check(result, elapsed);
    debug!(drift.result = result, "git drift check complete");

    if let Err(e) = shared
        .store
        .report_drift(key, drifted, chrono::Utc::now())
        .await
    {
        error!(error = %e, "failed to record git drift condition");
        metrics::increment_condition_write_failures();
    }
}
