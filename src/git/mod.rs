//! # Git
//!
//! Git reference model and the pieces of git the drift watcher needs:
//!
//! - `resolver.rs` - Turns a revision selector into a commit identifier
//! - `remote.rs` - Lists references advertised by a remote (`git ls-remote`)
//! - `url.rs` - Repository URL validation and parsing helpers
//!
//! Nothing here touches a working tree. References are listed from remotes and
//! resolved in memory.

pub mod remote;
pub mod resolver;
pub mod url;

use std::fmt;
use thiserror::Error;

pub use remote::{CliGitClient, GitClient, RemoteClient, RemoteConfig};
pub use resolver::{RefDatabase, ResolveError};
pub use url::UrlError;

/// Prefix for local branch references
pub const BRANCH_PREFIX: &str = "refs/heads/";
/// Prefix for tag references
pub const TAG_PREFIX: &str = "refs/tags/";
/// Prefix for remote-tracking references
pub const REMOTE_PREFIX: &str = "refs/remotes/";
/// Name of the symbolic HEAD reference
pub const HEAD: &str = "HEAD";

/// Errors raised while talking to a git remote
#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to execute git for {url}: {source}")]
    Spawn {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("git ls-remote {url} failed: {stderr}")]
    CommandFailed { url: String, stderr: String },
    #[error("remote {remote} has no URLs configured")]
    NoUrls { remote: String },
    #[error("malformed reference line {line:?}")]
    MalformedLine { line: String },
    #[error("invalid object id {0:?}")]
    InvalidObjectId(String),
}

/// A git object identifier (SHA-1 or SHA-256, lowercase hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse a full-length hex object id. Abbreviated ids are rejected.
    pub fn parse(value: &str) -> Result<Self, GitError> {
        let is_full_length = value.len() == 40 || value.len() == 64;
        if is_full_length && value.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Self(value.to_ascii_lowercase()))
        } else {
            Err(GitError::InvalidObjectId(value.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully qualified reference names for the addressing schemes git supports
#[must_use]
pub fn branch_ref(name: &str) -> String {
    format!("{BRANCH_PREFIX}{name}")
}

#[must_use]
pub fn tag_ref(name: &str) -> String {
    format!("{TAG_PREFIX}{name}")
}

/// `refs/remotes/<remote>/HEAD`
#[must_use]
pub fn remote_head_ref(remote: &str) -> String {
    format!("{REMOTE_PREFIX}{remote}/{HEAD}")
}

/// `refs/remotes/<remote>/<branch>`
#[must_use]
pub fn remote_branch_ref(remote: &str, branch: &str) -> String {
    format!("{REMOTE_PREFIX}{remote}/{branch}")
}

#[must_use]
pub fn is_tag_ref(name: &str) -> bool {
    name.starts_with(TAG_PREFIX)
}

/// What a reference points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    /// Points directly at an object (a commit, or a tag object for annotated tags)
    Object(ObjectId),
    /// Points at another reference by name (e.g. `HEAD -> refs/heads/main`)
    Symbolic(String),
}

/// A named git reference as advertised by a remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    name: String,
    target: RefTarget,
    /// For annotated tags: the commit the tag object peels to
    peeled: Option<ObjectId>,
}

impl Reference {
    #[must_use]
    pub fn new_hash(name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            name: name.into(),
            target: RefTarget::Object(id),
            peeled: None,
        }
    }

    #[must_use]
    pub fn new_symbolic(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: RefTarget::Symbolic(target.into()),
            peeled: None,
        }
    }

    /// An annotated tag: `id` is the tag object, `commit` is what it points at
    #[must_use]
    pub fn new_annotated_tag(name: impl Into<String>, id: ObjectId, commit: ObjectId) -> Self {
        Self {
            name: name.into(),
            target: RefTarget::Object(id),
            peeled: Some(commit),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn target(&self) -> &RefTarget {
        &self.target
    }

    #[must_use]
    pub fn is_symbolic(&self) -> bool {
        matches!(self.target, RefTarget::Symbolic(_))
    }

    /// Object id for hash references, `None` for symbolic ones
    #[must_use]
    pub fn hash(&self) -> Option<&ObjectId> {
        match &self.target {
            RefTarget::Object(id) => Some(id),
            RefTarget::Symbolic(_) => None,
        }
    }

    /// Name of the referenced ref for symbolic references
    #[must_use]
    pub fn symbolic_target(&self) -> Option<&str> {
        match &self.target {
            RefTarget::Symbolic(target) => Some(target),
            RefTarget::Object(_) => None,
        }
    }

    #[must_use]
    pub fn peeled(&self) -> Option<&ObjectId> {
        self.peeled.as_ref()
    }

    pub(crate) fn set_peeled(&mut self, commit: ObjectId) {
        self.peeled = Some(commit);
    }
}
