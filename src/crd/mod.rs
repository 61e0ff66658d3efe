//! # Custom Resource Definitions
//!
//! CRD types for the Patterns operator.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `Pattern` specification, git configuration and defaults
//! - `status.rs` - Status and condition types reported back onto the resource

mod spec;
mod status;

pub use spec::{
    default_cluster_group_name, GitConfig, Pattern, PatternSpec, DEFAULT_CLUSTER_GROUP_NAME,
};
pub use status::{
    ConditionStatus, PatternCondition, PatternConditionType, PatternStatus, GIT_IN_SYNC_MESSAGE,
    GIT_OUT_OF_SYNC_MESSAGE,
};

/// Finalizer added to every Pattern so cleanup runs before deletion
pub const PATTERN_FINALIZER: &str = "foregroundDeletePattern";
