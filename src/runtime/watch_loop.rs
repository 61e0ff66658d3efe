//! # Watch Loop
//!
//! Runs the `Pattern` controller and restarts its watch when the stream ends.

use crate::config::SharedControllerConfig;
use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::Pattern;
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::{watcher, Controller};
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::future::Future;
use tracing::{debug, info, warn, Instrument};

/// Watch `Pattern` resources in all namespaces until a shutdown signal arrives.
///
/// The probe server is marked not ready as soon as SIGINT/SIGTERM is received.
pub async fn run_watch_loop(
    patterns: Api<Pattern>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    controller_config: SharedControllerConfig,
) -> Result<(), anyhow::Error> {
    let backoff_start_ms = controller_config.read().await.backoff_start_ms;
    let backoff_ms = Arc::new(AtomicU64::new(backoff_start_ms));

    spawn_readiness_hook(Arc::clone(&server_state), shutdown_signal());

    loop {
        if !server_state.ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let backoff = Arc::clone(&backoff_ms);
        let filter_config = controller_config.clone();

        info!("Starting Pattern watch...");
        Controller::new(patterns.clone(), watcher::Config::default().any_semantic())
            .shutdown_on_signal()
            .run(reconcile, handle_reconciliation_error, Arc::clone(&reconciler))
            .filter_map(move |event| {
                let backoff = Arc::clone(&backoff);
                let config = filter_config.clone();
                async move {
                    match &event {
                        Ok((object, action)) => {
                            backoff.store(config.read().await.backoff_start_ms, Ordering::Relaxed);
                            debug!(pattern = %object, ?action, "watch.event.reconciled");
                            Some(event)
                        }
                        Err(e) => {
                            let (max_backoff_ms, restart_delay) = {
                                let config = config.read().await;
                                (config.backoff_max_ms, config.watch_restart_delay_duration())
                            };
                            handle_watch_stream_error(
                                &format!("{e:?}"),
                                &backoff,
                                max_backoff_ms,
                                restart_delay,
                            )
                            .await
                            .map(|()| event)
                        }
                    }
                }
            })
            .for_each(|_| futures::future::ready(()))
            .instrument(tracing::info_span!("controller.watch"))
            .await;

        if !server_state.ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let delay = controller_config
            .read()
            .await
            .watch_restart_delay_after_end_duration();
        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            delay.as_secs()
        );
        tokio::time::sleep(delay).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, initiating graceful shutdown..."),
        () = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// Mark the probe server not ready once `signal` resolves, so the watch loop
/// exits instead of restarting the controller.
pub fn spawn_readiness_hook<F>(server_state: Arc<ServerState>, signal: F) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        signal.await;
        server_state.set_ready(false);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_readiness_hook_clears_ready_on_signal() {
        let state = Arc::new(ServerState::default());
        state.set_ready(true);
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let hook = spawn_readiness_hook(Arc::clone(&state), async {
            let _ = rx.await;
        });
        tokio::task::yield_now().await;
        assert!(state.ready());

        tx.send(()).unwrap();
        hook.await.unwrap();
        assert!(!state.ready());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sigterm_triggers_shutdown() {
        let signal = tokio::spawn(shutdown_signal());
        // let the handlers register before the signal is raised
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(std::time::Duration::from_secs(5), signal)
            .await
            .unwrap()
            .unwrap();
    }
}
