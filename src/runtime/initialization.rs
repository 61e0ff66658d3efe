//! # Initialization
//!
//! Operator startup: rustls, tracing, metrics, probe server, Kubernetes client,
//! the git drift watcher and the reconciler context.

use crate::config::{create_shared_config, SharedControllerConfig, SharedServerConfig};
use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::{start_server, ServerState};
use crate::crd::Pattern;
use crate::drift::{DriftDetector, DriftWatcher, KubePatternStore, PatternStore, ShutdownHandle};
use crate::git::CliGitClient;
use crate::observability;
use anyhow::{Context, Result};
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

/// Everything the watch loop needs
pub struct InitializationResult {
    pub client: Client,
    /// `Pattern` API across all namespaces
    pub patterns: Api<Pattern>,
    pub reconciler: Arc<Reconciler>,
    pub server_state: Arc<ServerState>,
    /// Stops the drift watcher's background task
    pub drift_shutdown: ShutdownHandle,
    pub controller_config: SharedControllerConfig,
    pub server_config: SharedServerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.ready())
            .field("drift_watcher", &self.reconciler.drift_watcher)
            .finish_non_exhaustive()
    }
}

/// Initialize the operator runtime
pub async fn initialize() -> Result<InitializationResult> {
    // Must run before anything opens a TLS connection
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_already_installed| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let (controller_config, server_config) = create_shared_config();

    let log_level = controller_config.read().await.log_level.to_lowercase();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("patterns_operator={log_level}").into()),
        )
        .init();

    info!("Starting Patterns Operator");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_port = server_config.read().await.metrics_port;
    let server_state_clone = Arc::clone(&server_state);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let patterns: Api<Pattern> = Api::all(client.clone());

    let (git_binary, check_timeout) = {
        let config = controller_config.read().await;
        (config.git_binary.clone(), config.drift_check_timeout())
    };
    let store: Arc<dyn PatternStore> = Arc::new(KubePatternStore::new(client.clone()));
    let detector = DriftDetector::new(Arc::new(CliGitClient::new(git_binary)), Arc::clone(&store));
    let drift_watcher = DriftWatcher::new(detector, store, check_timeout);
    let drift_shutdown = drift_watcher.watch();

    let reconciler = Arc::new(Reconciler::new(
        client.clone(),
        drift_watcher,
        controller_config.clone(),
    ));

    reconcile_existing_resources(&patterns, &reconciler)
        .instrument(tracing::info_span!("controller.startup.reconcile_existing"))
        .await?;

    info!("Operator initialized, starting watch loop...");
    Ok(InitializationResult {
        client,
        patterns,
        reconciler,
        server_state,
        drift_shutdown,
        controller_config,
        server_config,
    })
}

async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    server_config: &SharedServerConfig,
) -> Result<()> {
    let (startup_timeout, poll_interval) = {
        let config = server_config.read().await;
        (config.startup_timeout(), config.poll_interval())
    };
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }
        if server_state.ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }
        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// Reconcile Patterns that existed before the operator started, so drift
/// watches are in place before the first watch event arrives.
async fn reconcile_existing_resources(
    patterns: &Api<Pattern>,
    reconciler: &Arc<Reconciler>,
) -> Result<()> {
    let list = patterns
        .list(&ListParams::default())
        .await
        .context("Pattern CRD is not queryable, is it installed?")?;
    info!("Found {} existing Pattern resources", list.items.len());

    for pattern in list.items {
        let name = pattern.name_any();
        let namespace = pattern.namespace().unwrap_or_default();
        match reconcile(Arc::new(pattern), Arc::clone(reconciler)).await {
            Ok(_action) => info!(
                pattern.name = name.as_str(),
                pattern.namespace = namespace.as_str(),
                "reconciled existing pattern"
            ),
            Err(e) => warn!(
                pattern.name = name.as_str(),
                pattern.namespace = namespace.as_str(),
                error = %e,
                "failed to reconcile existing pattern, the watch will retry"
            ),
        }
    }
    Ok(())
}
