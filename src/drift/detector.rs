//! # Drift Detector
//!
//! Compares the commit an origin repository points at with the commit its
//! target repository points at. Each check reloads the Pattern's git
//! configuration, lists both remotes and resolves each side to a hash.

use super::pair::PatternKey;
use super::store::{PatternStore, StoreError};
use crate::git::resolver::{find_branch, head_branch};
use crate::git::{branch_ref, GitClient, GitError, ObjectId, Reference, RemoteConfig, HEAD};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const ORIGIN_REMOTE: &str = "origin";
const TARGET_REMOTE: &str = "target";

#[derive(Debug, Error)]
pub enum DriftError {
    #[error("git config does not have an origin and target repository for pattern {0}")]
    MissingRepository(PatternKey),
    #[error(transparent)]
    Transport(#[from] GitError),
    #[error("no references found for {remote} {url}")]
    NoReferences { remote: &'static str, url: String },
    #[error("unable to find {reference} for {remote} {url}")]
    ReferenceNotFound {
        reference: String,
        remote: &'static str,
        url: String,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("drift check timed out after {0:?}")]
    Timeout(Duration),
}

/// Origin-versus-target drift check for a single Pattern
#[derive(Clone)]
pub struct DriftDetector {
    git: Arc<dyn GitClient>,
    store: Arc<dyn PatternStore>,
}

impl std::fmt::Debug for DriftDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriftDetector")
            .field("git", &self.git)
            .finish_non_exhaustive()
    }
}

impl DriftDetector {
    #[must_use]
    pub fn new(git: Arc<dyn GitClient>, store: Arc<dyn PatternStore>) -> Self {
        Self { git, store }
    }

    /// Whether origin and target currently resolve to different commits.
    ///
    /// The target remote is only contacted after the origin listing succeeds.
    pub async fn has_drifted(&self, key: &PatternKey) -> Result<bool, DriftError> {
        let config = self.store.git_config(key).await?;
        if config.origin_repo.is_empty() || config.target_repo.is_empty() {
            return Err(DriftError::MissingRepository(key.clone()));
        }

        let origin_refs = self.list(ORIGIN_REMOTE, &config.origin_repo).await?;
        let target_refs = self.list(TARGET_REMOTE, &config.target_repo).await?;

        let origin = tracked_commit(
            &origin_refs,
            &config.origin_revision,
            ORIGIN_REMOTE,
            &config.origin_repo,
        )?;
        let target = tracked_commit(
            &target_refs,
            &config.target_revision,
            TARGET_REMOTE,
            &config.target_repo,
        )?;

        debug!(
            pattern = %key,
            origin = %origin,
            target = %target,
            "resolved origin and target commits"
        );
        Ok(origin != target)
    }

    async fn list(&self, remote: &'static str, url: &str) -> Result<Vec<Reference>, DriftError> {
        let client = self
            .git
            .new_remote_client(RemoteConfig::new(remote, url));
        let references = client.list().await?;
        if references.is_empty() {
            return Err(DriftError::NoReferences {
                remote,
                url: url.to_string(),
            });
        }
        Ok(references)
    }
}

/// Commit a remote's tracked revision points at.
///
/// An explicit revision is looked up as `refs/heads/<revision>` only; without
/// one the symbolic HEAD chain is followed.
fn tracked_commit(
    references: &[Reference],
    revision: &str,
    remote: &'static str,
    url: &str,
) -> Result<ObjectId, DriftError> {
    let not_found = |reference: String| DriftError::ReferenceNotFound {
        reference,
        remote,
        url: url.to_string(),
    };

    let found = if revision.is_empty() {
        head_branch(references).map_err(|_unresolved| not_found(HEAD.to_string()))?
    } else {
        find_branch(references, revision).ok_or_else(|| not_found(branch_ref(revision)))?
    };

    found
        .hash()
        .cloned()
        .ok_or_else(|| not_found(found.name().to_string()))
}
