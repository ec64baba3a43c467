//! The [`RefStore`] trait defining the reference storage interface.

use trellis_types::ObjectId;

use crate::error::Result;
use crate::types::{Head, Ref};

/// Storage backend for named references.
///
/// Names are canonical and hierarchical:
///
/// - `refs/heads/*` for branches
/// - `refs/tags/*` for tags
/// - `refs/remotes/{remote}/*` for remote tracking refs
pub trait RefStore: Send + Sync {
    /// Read a ref by its canonical name (e.g. "refs/heads/main").
    ///
    /// Returns `Ok(None)` if the ref does not exist.
    fn read_ref(&self, name: &str) -> Result<Option<Ref>>;

    /// Write (create or update) a ref at the given canonical name.
    ///
    /// Fails for an existing tag; use `delete_ref` + `write_ref` to move one.
    fn write_ref(&self, name: &str, reference: &Ref) -> Result<()>;

    /// Delete a ref by canonical name. Returns whether it existed.
    fn delete_ref(&self, name: &str) -> Result<bool>;

    /// List all refs whose canonical name starts with `prefix`, sorted by
    /// name. Pass `""` to list everything.
    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, Ref)>>;

    /// Read the current HEAD state, `None` if it was never set.
    fn head(&self) -> Result<Option<Head>>;

    /// Point HEAD at a branch (symbolic ref). The branch need not exist yet.
    fn set_head(&self, branch: &str) -> Result<()>;

    /// Detach HEAD at a commit.
    fn set_head_detached(&self, target: ObjectId) -> Result<()>;

    fn branches(&self) -> Result<Vec<(String, Ref)>> {
        self.list_refs("refs/heads/")
    }

    fn tags(&self) -> Result<Vec<(String, Ref)>> {
        self.list_refs("refs/tags/")
    }

    /// The commit HEAD currently designates.
    ///
    /// `None` when HEAD is unset or names a branch with no commits yet.
    fn resolve_head(&self) -> Result<Option<ObjectId>> {
        match self.head()? {
            None => Ok(None),
            Some(Head::Detached(id)) => Ok(Some(id)),
            Some(Head::Symbolic(branch)) => Ok(self
                .read_ref(&format!("refs/heads/{branch}"))?
                .map(|r| r.target())),
        }
    }

    /// Name of the checked-out branch, `None` when detached or unset.
    fn current_branch(&self) -> Result<Option<String>> {
        Ok(match self.head()? {
            Some(Head::Symbolic(branch)) => Some(branch),
            _ => None,
        })
    }
}
