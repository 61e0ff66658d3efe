//! # Runtime
//!
//! Process-level wiring for the operator.
//!
//! - `initialization`: tracing, metrics, probe server, Kubernetes client and drift watcher setup
//! - `watch_loop`: the `Pattern` controller loop with restart handling
//! - `error_policy`: reconcile error backoff and watch stream error classification

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
