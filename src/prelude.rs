//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use patterns_operator::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Drift detection
pub use crate::drift::{
    DriftDetector, DriftError, DriftWatcher, PatternKey, PatternStore, ShutdownHandle, StoreError,
    WatchError,
};

// Git remotes
pub use crate::git::{GitClient, GitError, ObjectId, Reference, RemoteClient, RemoteConfig};

// Reconciler types
pub use crate::controller::reconciler::{reconcile, BackoffState, Reconciler, ReconcilerError};

// Config types
pub use crate::config::{
    ControllerConfig, ServerConfig, SharedControllerConfig, SharedServerConfig,
};
