//! # Controller
//!
//! Core controller modules for the Patterns operator.
//!
//! - `backoff`: Fibonacci backoff for failed reconciliations
//! - `reconciler`: Pattern reconciliation and drift watch membership
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod reconciler;
pub mod server;
