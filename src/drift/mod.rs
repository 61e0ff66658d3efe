//! # Git Drift Detection
//!
//! Continuously compares each watched Pattern's origin repository with its
//! target repository and reports the outcome as a status condition.
//!
//! ## Module Structure
//!
//! - `pair.rs` - Watched Patterns ordered by next check time
//! - `detector.rs` - One origin-versus-target comparison
//! - `watcher.rs` - Background scheduler driving the detector
//! - `conditions.rs` - `GitInSync` / `GitOutOfSync` condition transitions
//! - `store.rs` - Reading git config and writing conditions on the Pattern

pub mod conditions;
pub mod detector;
pub mod pair;
pub mod store;
pub mod watcher;

pub use conditions::set_git_condition;
pub use detector::{DriftDetector, DriftError};
pub use pair::{PatternKey, RepositoryPair, RepositoryPairQueue};
pub use store::{InMemoryPatternStore, KubePatternStore, PatternStore, StoreError};
pub use watcher::{DriftWatcher, ShutdownHandle, WatchError};
