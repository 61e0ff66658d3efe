//! # Revision Resolution
//!
//! Resolves symbolic revision selectors (branch, tag, commit, `HEAD`) against a
//! list of references fetched from a remote.
//!
//! Resolution order for [`commit_from_target`]:
//!
//! 1. Empty selector: the `main` branch
//! 2. A full object id that is known to the reference set (commit pinning)
//! 3. `HEAD`: the repository's own HEAD pointer
//! 4. Branch, tag, remote HEAD alias, remote-tracking branch (first match wins)
//!
//! Anything else is an unknown target.
//!
//! The drift detector does not use this chain: it follows HEAD for an empty
//! revision and otherwise looks up the branch only, via [`head_branch`] and
//! [`find_branch`].

use super::{
    branch_ref, is_tag_ref, remote_branch_ref, remote_head_ref, tag_ref, ObjectId, RefTarget,
    Reference, HEAD,
};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Symbolic references are followed at most this many times
const MAX_SYMBOLIC_DEPTH: usize = 5;

/// Remote name used for remote-tracking branch lookups
const DEFAULT_REMOTE: &str = "origin";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no references found")]
    NoReferences,
    #[error("unable to find HEAD")]
    HeadNotFound,
    #[error("reference not found: {0}")]
    ReferenceNotFound(String),
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),
    #[error("symbolic reference depth exceeded while resolving {0}")]
    SymbolicDepthExceeded(String),
    #[error("unsupported tag object target \"{0}\"")]
    UnsupportedTagObjectTarget(ObjectType),
    #[error("unsupported tag target \"{0}\"")]
    UnsupportedTagTarget(ObjectType),
    #[error("unknown target {0:?}")]
    UnknownTarget(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Commit,
    Tree,
    Blob,
    Tag,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectType::Commit => "commit",
            ObjectType::Tree => "tree",
            ObjectType::Blob => "blob",
            ObjectType::Tag => "tag",
        };
        f.write_str(name)
    }
}

/// An object known to the reference set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitObject {
    Commit(ObjectId),
    /// Annotated tag object pointing at `target`
    Tag {
        id: ObjectId,
        target: ObjectId,
        target_type: ObjectType,
    },
    Other { id: ObjectId, kind: ObjectType },
}

/// References indexed by name plus the objects they reveal.
///
/// Built from a reference listing. Hash references contribute commit objects;
/// annotated tags contribute a tag object and the commit it peels to.
#[derive(Debug, Clone, Default)]
pub struct RefDatabase {
    references: HashMap<String, Reference>,
    objects: HashMap<ObjectId, GitObject>,
}

impl RefDatabase {
    #[must_use]
    pub fn from_references(references: &[Reference]) -> Self {
        let mut db = Self::default();
        for reference in references {
            db.insert_reference(reference.clone());
        }
        db
    }

    pub fn insert_reference(&mut self, reference: Reference) {
        if let RefTarget::Object(id) = reference.target() {
            match reference.peeled() {
                Some(commit) => {
                    self.objects.insert(
                        id.clone(),
                        GitObject::Tag {
                            id: id.clone(),
                            target: commit.clone(),
                            target_type: ObjectType::Commit,
                        },
                    );
                    self.objects
                        .entry(commit.clone())
                        .or_insert_with(|| GitObject::Commit(commit.clone()));
                }
                None => {
                    self.objects
                        .entry(id.clone())
                        .or_insert_with(|| GitObject::Commit(id.clone()));
                }
            }
        }
        self.references
            .insert(reference.name().to_string(), reference);
    }

    /// Register an object explicitly, replacing whatever was inferred for its id
    pub fn insert_object(&mut self, object: GitObject) {
        let id = match &object {
            GitObject::Commit(id) | GitObject::Tag { id, .. } | GitObject::Other { id, .. } => {
                id.clone()
            }
        };
        self.objects.insert(id, object);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    #[must_use]
    pub fn object(&self, id: &ObjectId) -> Option<&GitObject> {
        self.objects.get(id)
    }

    /// Look up a reference by name, following symbolic references
    pub fn resolve_reference(&self, name: &str) -> Result<&Reference, ResolveError> {
        let mut current = name;
        for _ in 0..=MAX_SYMBOLIC_DEPTH {
            let reference = self
                .references
                .get(current)
                .ok_or_else(|| ResolveError::ReferenceNotFound(current.to_string()))?;
            match reference.target() {
                RefTarget::Object(_) => return Ok(reference),
                RefTarget::Symbolic(target) => current = target.as_str(),
            }
        }
        Err(ResolveError::SymbolicDepthExceeded(name.to_string()))
    }
}

/// Commit id a reference ultimately designates.
///
/// Non-tag references answer with their own hash. Tags are dereferenced once:
/// lightweight tags already name a commit, annotated tags name a tag object
/// that must point at a commit.
pub fn hash_from_reference(db: &RefDatabase, name: &str) -> Result<ObjectId, ResolveError> {
    let reference = db.resolve_reference(name)?;
    let id = reference
        .hash()
        .ok_or_else(|| ResolveError::ReferenceNotFound(name.to_string()))?;

    if !is_tag_ref(reference.name()) {
        return Ok(id.clone());
    }

    match db.object(id) {
        Some(GitObject::Commit(commit)) => Ok(commit.clone()),
        Some(GitObject::Tag {
            target,
            target_type: ObjectType::Commit,
            ..
        }) => Ok(target.clone()),
        Some(GitObject::Tag { target_type, .. }) => {
            Err(ResolveError::UnsupportedTagObjectTarget(*target_type))
        }
        Some(GitObject::Other { kind, .. }) => Err(ResolveError::UnsupportedTagTarget(*kind)),
        None => Err(ResolveError::ObjectNotFound(id.clone())),
    }
}

/// Resolve a revision selector to a commit id
pub fn commit_from_target(db: &RefDatabase, selector: &str) -> Result<ObjectId, ResolveError> {
    if selector.is_empty() {
        return hash_from_reference(db, &branch_ref("main"));
    }

    if let Ok(id) = ObjectId::parse(selector) {
        if db.object(&id).is_some() {
            return Ok(id);
        }
    }

    if selector == HEAD {
        return hash_from_reference(db, HEAD);
    }

    let candidates = [
        branch_ref(selector),
        tag_ref(selector),
        remote_head_ref(selector),
        remote_branch_ref(DEFAULT_REMOTE, selector),
    ];
    candidates
        .iter()
        .find_map(|name| hash_from_reference(db, name).ok())
        .ok_or_else(|| ResolveError::UnknownTarget(selector.to_string()))
}

/// Convenience wrapper: resolve `selector` against a plain reference list
pub fn resolve(references: &[Reference], selector: &str) -> Result<ObjectId, ResolveError> {
    if references.is_empty() {
        return Err(ResolveError::NoReferences);
    }
    commit_from_target(&RefDatabase::from_references(references), selector)
}

/// The reference HEAD points at.
///
/// Two lookups, not a recursive walk: find the symbolic `HEAD` entry, then the
/// entry it names.
pub fn head_branch(references: &[Reference]) -> Result<&Reference, ResolveError> {
    if references.is_empty() {
        return Err(ResolveError::NoReferences);
    }
    let target = references
        .iter()
        .filter(|r| r.name() == HEAD)
        .find_map(Reference::symbolic_target)
        .ok_or(ResolveError::HeadNotFound)?;
    references
        .iter()
        .find(|r| r.name() == target)
        .ok_or_else(|| ResolveError::ReferenceNotFound(target.to_string()))
}

/// Branch `refs/heads/<name>` from a reference list
#[must_use]
pub fn find_branch<'a>(references: &'a [Reference], name: &str) -> Option<&'a Reference> {
    let full_name = branch_ref(name);
    references.iter().find(|r| r.name() == full_name)
}
