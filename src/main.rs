//! # Patterns Operator
//!
//! A Kubernetes operator for GitOps `Pattern` resources.
//!
//! ## Overview
//!
//! For every Pattern that names both an upstream (origin) and a deployed
//! (target) git repository the operator:
//!
//! 1. **Polls both remotes** - Lists references with `git ls-remote` on the Pattern's `pollInterval`
//! 2. **Compares commits** - Resolves each side's tracked revision and compares the hashes
//! 3. **Reports drift** - Sets the `GitInSync` or `GitOutOfSync` condition on the Pattern
//!
//! Metrics and health probes are served on `METRICS_PORT` (default 8080).

use anyhow::Result;
use patterns_operator::runtime::{initialization::initialize, watch_loop::run_watch_loop};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    let result = run_watch_loop(
        init.patterns,
        init.reconciler,
        init.server_state,
        init.controller_config,
    )
    .await;

    init.drift_shutdown.shutdown();
    info!("git drift watcher stopped");
    result
}
