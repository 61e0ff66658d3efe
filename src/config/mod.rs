//! # Configuration
//!
//! Operator configuration loaded from environment variables.
//!
//! - `controller.rs` - Reconciliation, drift watcher and watch-loop settings
//! - `server.rs` - HTTP server settings for metrics and probes
//!
//! Both are shared as `Arc<RwLock<_>>` so long-running tasks always read the
//! current values.

mod controller;
mod server;

pub use controller::ControllerConfig;
pub use server::ServerConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedControllerConfig = Arc<RwLock<ControllerConfig>>;
pub type SharedServerConfig = Arc<RwLock<ServerConfig>>;

/// Load both configurations from the environment
#[must_use]
pub fn create_shared_config() -> (SharedControllerConfig, SharedServerConfig) {
    (
        Arc::new(RwLock::new(ControllerConfig::from_env())),
        Arc::new(RwLock::new(ServerConfig::from_env())),
    )
}

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
pub(crate) fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
