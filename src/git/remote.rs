//! # Remote Reference Listing
//!
//! The only network-facing piece of the drift watcher. A [`GitClient`] hands out
//! [`RemoteClient`]s scoped to one named remote; a remote client lists every
//! reference the remote advertises.
//!
//! The production client shells out to `git ls-remote --symref` rather than
//! linking libgit2, the same approach the rest of the controller takes for git.

use super::{GitError, ObjectId, Reference, HEAD};
use async_trait::async_trait;
use std::fmt;
use tracing::debug;

/// A named remote and the URLs it can be reached at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub name: String,
    pub urls: Vec<String>,
}

impl RemoteConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            urls: vec![url.into()],
        }
    }
}

/// Lists references for a single remote
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn list(&self) -> Result<Vec<Reference>, GitError>;
}

/// Factory for remote clients
pub trait GitClient: Send + Sync + fmt::Debug {
    fn new_remote_client(&self, remote: RemoteConfig) -> Box<dyn RemoteClient>;
}

/// [`GitClient`] backed by the `git` command-line binary
#[derive(Debug, Clone)]
pub struct CliGitClient {
    git_binary: String,
}

impl CliGitClient {
    #[must_use]
    pub fn new(git_binary: impl Into<String>) -> Self {
        Self {
            git_binary: git_binary.into(),
        }
    }
}

impl Default for CliGitClient {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitClient for CliGitClient {
    fn new_remote_client(&self, remote: RemoteConfig) -> Box<dyn RemoteClient> {
        Box::new(CliRemoteClient {
            git_binary: self.git_binary.clone(),
            remote,
        })
    }
}

#[derive(Debug)]
struct CliRemoteClient {
    git_binary: String,
    remote: RemoteConfig,
}

#[async_trait]
impl RemoteClient for CliRemoteClient {
    async fn list(&self) -> Result<Vec<Reference>, GitError> {
        let url = self
            .remote
            .urls
            .first()
            .ok_or_else(|| GitError::NoUrls {
                remote: self.remote.name.clone(),
            })?;

        debug!(remote = %self.remote.name, url = %url, "git ls-remote");

        let output = tokio::process::Command::new(&self.git_binary)
            .arg("ls-remote")
            .arg("--symref")
            .arg(url)
            // Never block on a credentials prompt
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| GitError::Spawn {
                url: url.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                url: url.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_ls_remote(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse `git ls-remote --symref` output.
///
/// ```text
/// ref: refs/heads/main	HEAD
/// 1111111111111111111111111111111111111111	HEAD
/// 1111111111111111111111111111111111111111	refs/heads/main
/// 2222222222222222222222222222222222222222	refs/tags/v1.0
/// 3333333333333333333333333333333333333333	refs/tags/v1.0^{}
/// ```
///
/// A symbolic line wins over the hash line for the same name. `^{}` lines turn
/// the preceding tag into an annotated tag peeling to that commit.
pub fn parse_ls_remote(output: &str) -> Result<Vec<Reference>, GitError> {
    let mut references: Vec<Reference> = Vec::new();

    for line in output.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
        let malformed = || GitError::MalformedLine {
            line: line.to_string(),
        };
        let (left, name) = line.split_once('\t').ok_or_else(malformed)?;

        if let Some(target) = left.strip_prefix("ref: ") {
            references.retain(|r| r.name() != name);
            references.push(Reference::new_symbolic(name, target.trim()));
            continue;
        }

        let id = ObjectId::parse(left.trim()).ok().ok_or_else(malformed)?;

        if let Some(tag) = name.strip_suffix("^{}") {
            let tag_ref = references
                .iter_mut()
                .find(|r| r.name() == tag)
                .ok_or_else(malformed)?;
            tag_ref.set_peeled(id);
            continue;
        }

        let already_symbolic = references
            .iter()
            .any(|r| r.name() == name && r.is_symbolic());
        if name == HEAD && already_symbolic {
            continue;
        }
        references.push(Reference::new_hash(name, id));
    }

    Ok(references)
}
