//! Patterns Operator Library
//!
//! Reconciles `Pattern` resources and watches each Pattern's origin and target
//! git repositories for drift, reporting the result as a status condition.
//!
//! ## Quick Start
//!
//! ```rust
//! use patterns_operator::prelude::*;
//! ```

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod drift;
pub mod git;
pub mod observability;
pub mod prelude;
pub mod runtime;
