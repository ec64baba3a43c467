//! Core reference types.

use serde::{Deserialize, Serialize};
use trellis_types::ObjectId;

/// A named pointer to a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ref {
    /// A mutable pointer to a branch tip.
    Branch {
        /// Branch name (e.g. "main", "feature/auth").
        name: String,
        target: ObjectId,
    },

    /// An immutable pointer to a specific commit.
    Tag {
        /// Tag name (e.g. "v1.0.0").
        name: String,
        target: ObjectId,
        /// Free-form annotation; empty for lightweight tags.
        message: String,
    },

    /// Mirror of a branch on a remote repository.
    Remote {
        /// Name of the remote (e.g. "origin").
        remote: String,
        /// Branch name on the remote.
        branch: String,
        target: ObjectId,
    },
}

impl Ref {
    pub fn branch(name: impl Into<String>, target: ObjectId) -> Self {
        Ref::Branch {
            name: name.into(),
            target,
        }
    }

    pub fn tag(name: impl Into<String>, target: ObjectId, message: impl Into<String>) -> Self {
        Ref::Tag {
            name: name.into(),
            target,
            message: message.into(),
        }
    }

    pub fn remote(remote: impl Into<String>, branch: impl Into<String>, target: ObjectId) -> Self {
        Ref::Remote {
            remote: remote.into(),
            branch: branch.into(),
            target,
        }
    }

    /// Returns the canonical name for this ref (e.g. "refs/heads/main").
    pub fn canonical_name(&self) -> String {
        match self {
            Ref::Branch { name, .. } => format!("refs/heads/{name}"),
            Ref::Tag { name, .. } => format!("refs/tags/{name}"),
            Ref::Remote { remote, branch, .. } => format!("refs/remotes/{remote}/{branch}"),
        }
    }

    /// The name as usually displayed: `main`, `v1.0`, `origin/main`.
    pub fn short_name(&self) -> String {
        match self {
            Ref::Branch { name, .. } | Ref::Tag { name, .. } => name.clone(),
            Ref::Remote { remote, branch, .. } => format!("{remote}/{branch}"),
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Ref::Branch { .. })
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, Ref::Tag { .. })
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Ref::Remote { .. })
    }

    /// The commit this ref points to.
    pub fn target(&self) -> ObjectId {
        match self {
            Ref::Branch { target, .. } | Ref::Tag { target, .. } | Ref::Remote { target, .. } => {
                *target
            }
        }
    }
}

/// The state of HEAD: either symbolic (pointing to a branch) or detached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Head {
    /// HEAD points to a branch by short name.
    Symbolic(String),
    /// HEAD is detached at a commit.
    Detached(ObjectId),
}
