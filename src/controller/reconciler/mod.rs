//! # Reconciler
//!
//! Reconciles `Pattern` resources against the git drift watcher.
//!
//! ## Module Structure
//!
//! - `types.rs` - Reconciler context, errors and per-resource backoff state
//! - `defaults.rs` - Qualifying a Pattern spec and validating its repositories
//! - `drift_watch.rs` - Adding, updating and removing the Pattern's drift watch
//! - `status.rs` - Recording `lastStep` / `lastError`
//!
//! Each reconcile adds the finalizer if missing, qualifies the spec, syncs the
//! drift watch and records the step. When a Pattern is deleted its drift watch
//! is dropped before the finalizer is released.

mod defaults;
mod drift_watch;
mod status;
mod types;

pub use defaults::{apply_defaults, validate_git_spec};
pub use drift_watch::{sync_drift_watch, DriftWatchStep};
pub use status::{record_step, step_patch};
pub use types::{BackoffState, Reconciler, ReconcilerError};

use crate::crd::{Pattern, PATTERN_FINALIZER};
use crate::observability;
use kube::api::Api;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use kube_runtime::finalizer::{finalizer, Event as Finalizer};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const VALIDATION_STEP: &str = "validating git configuration";
const FINALIZE_STEP: &str = "finalize";

/// Reconcile a single Pattern
pub async fn reconcile(
    pattern: Arc<Pattern>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let start = Instant::now();
    observability::metrics::increment_reconciliations();

    let namespace = pattern
        .namespace()
        .ok_or(ReconcilerError::MissingMetadata("namespace"))?;
    let api: Api<Pattern> = Api::namespaced(ctx.client.clone(), &namespace);

    let result = finalizer(&api, PATTERN_FINALIZER, pattern, |event| async {
        match event {
            Finalizer::Apply(pattern) => apply(&pattern, &api, &ctx).await,
            Finalizer::Cleanup(pattern) => cleanup(&pattern, &ctx),
        }
    })
    .await
    .map_err(|e| ReconcilerError::Finalizer(Box::new(e)));

    observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
    result
}

async fn apply(
    pattern: &Pattern,
    api: &Api<Pattern>,
    ctx: &Reconciler,
) -> Result<Action, ReconcilerError> {
    let name = pattern.name_any();
    let namespace = pattern.namespace().unwrap_or_default();
    let config = ctx.config.read().await.clone();

    let qualified = apply_defaults(&pattern.spec, config.min_poll_interval_secs);

    let repository = match validate_git_spec(&qualified) {
        Ok(repository) => repository,
        Err(e) => {
            let err = ReconcilerError::from(e);
            report_failure(api, &name, VALIDATION_STEP, &err).await;
            return Err(err);
        }
    };
    debug!(
        pattern.name = name.as_str(),
        pattern.namespace = namespace.as_str(),
        repository = repository.as_str(),
        hostname = qualified.git_spec.hostname.as_str(),
        "git configuration valid"
    );

    let step = match sync_drift_watch(&ctx.drift_watcher, &name, &namespace, &qualified.git_spec)
    {
        Ok(step) => step,
        Err((step, e)) => {
            let err = ReconcilerError::from(e);
            report_failure(api, &name, step.as_str(), &err).await;
            return Err(err);
        }
    };

    record_step(api, &name, step.as_str(), None).await?;

    let resource_key = format!("{namespace}/{name}");
    if ctx.reset_backoff(&resource_key) {
        info!(
            pattern.name = name.as_str(),
            pattern.namespace = namespace.as_str(),
            "backoff reset, returning to normal schedule"
        );
    }

    info!(
        pattern.name = name.as_str(),
        pattern.namespace = namespace.as_str(),
        step = step.as_str(),
        "reconcile step complete"
    );
    observability::metrics::increment_requeues_total("timer-based");
    Ok(Action::requeue(config.reconcile_interval_duration()))
}

fn cleanup(pattern: &Pattern, ctx: &Reconciler) -> Result<Action, ReconcilerError> {
    let name = pattern.name_any();
    let namespace = pattern.namespace().unwrap_or_default();

    if ctx.drift_watcher.is_watching(&name, &namespace) {
        ctx.drift_watcher.remove(&name, &namespace)?;
    }
    info!(
        pattern.name = name.as_str(),
        pattern.namespace = namespace.as_str(),
        step = FINALIZE_STEP,
        "pattern finalized"
    );
    Ok(Action::await_change())
}

async fn report_failure(api: &Api<Pattern>, name: &str, step: &str, err: &ReconcilerError) {
    warn!(pattern.name = name, step, error = %err, "reconcile step failed");
    if let Err(e) = record_step(api, name, step, Some(&err.to_string())).await {
        warn!(pattern.name = name, error = %e, "failed to record reconcile error in status");
    }
}
