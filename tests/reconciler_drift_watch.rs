//! Drift watch membership as driven by Pattern reconciliation.

use patterns_operator::controller::reconciler::{apply_defaults, sync_drift_watch, DriftWatchStep};
use patterns_operator::crd::{GitConfig, PatternSpec};
use patterns_operator::drift::{
    DriftDetector, DriftWatcher, InMemoryPatternStore, PatternStore, WatchError,
};
use patterns_operator::git::{GitClient, RemoteClient, RemoteConfig};
use std::sync::Arc;

#[derive(Debug)]
struct UnusedGit;

impl GitClient for UnusedGit {
    fn new_remote_client(&self, _remote: RemoteConfig) -> Box<dyn RemoteClient> {
        unreachable!("membership changes never contact a remote")
    }
}

fn watcher() -> DriftWatcher {
    let store: Arc<dyn PatternStore> = Arc::new(InMemoryPatternStore::new());
    let detector = DriftDetector::new(Arc::new(UnusedGit), Arc::clone(&store));
    DriftWatcher::new(detector, store, None)
}

fn spec(origin_repo: &str, poll_interval: i64) -> PatternSpec {
    PatternSpec {
        cluster_group_name: "hub".to_string(),
        git_spec: GitConfig {
            target_repo: "https://gitea.example.com/org/multicloud-gitops".to_string(),
            origin_repo: origin_repo.to_string(),
            poll_interval,
            ..GitConfig::default()
        },
    }
}

const ORIGIN: &str = "https://github.com/validatedpatterns/multicloud-gitops";

#[tokio::test(start_paused = true)]
async fn test_membership_follows_git_config() {
    let watcher = watcher();
    let shutdown = watcher.watch();

    let qualified = apply_defaults(&spec(ORIGIN, 0), 180);
    assert_eq!(qualified.git_spec.poll_interval, 180);
    assert_eq!(
        sync_drift_watch(&watcher, "mcg", "patterns", &qualified.git_spec),
        Ok(DriftWatchStep::Added)
    );
    assert!(watcher.is_watching("mcg", "patterns"));

    let qualified = apply_defaults(&spec(ORIGIN, 600), 180);
    assert_eq!(
        sync_drift_watch(&watcher, "mcg", "patterns", &qualified.git_spec),
        Ok(DriftWatchStep::Updated)
    );

    let qualified = apply_defaults(&spec(ORIGIN, -1), 180);
    assert_eq!(
        sync_drift_watch(&watcher, "mcg", "patterns", &qualified.git_spec),
        Ok(DriftWatchStep::Removed)
    );
    assert!(!watcher.is_watching("mcg", "patterns"));

    assert_eq!(
        sync_drift_watch(&watcher, "mcg", "patterns", &qualified.git_spec),
        Ok(DriftWatchStep::NotWatched)
    );
    shutdown.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_pattern_without_origin_is_not_watched() {
    let watcher = watcher();
    let shutdown = watcher.watch();

    let qualified = apply_defaults(&spec("", 300), 180);
    assert_eq!(
        sync_drift_watch(&watcher, "mcg", "patterns", &qualified.git_spec),
        Ok(DriftWatchStep::NotWatched)
    );
    assert!(watcher.watched().is_empty());
    shutdown.shutdown();
}

#[tokio::test]
async fn test_failed_step_is_reported() {
    let watcher = watcher();
    let qualified = apply_defaults(&spec(ORIGIN, 300), 180);

    let (step, err) =
        sync_drift_watch(&watcher, "mcg", "patterns", &qualified.git_spec).unwrap_err();
    assert_eq!(step, DriftWatchStep::Added);
    assert_eq!(step.as_str(), "add pattern to git drift watcher");
    assert_eq!(err, WatchError::NotStarted);
}
