//! The commit graph of a repository, memoized.
//!
//! [`RepositoryGraph`] reads refs and commits from the stores on first use
//! and keeps every derived stage in a [`GraphCache`] until
//! [`RepositoryGraph::invalidate_all`] or a change of simplification mode.
//! It also answers per-commit change queries, which are not cached.

use std::sync::Arc;

use tracing::{debug, warn};
use trellis_diff::{compare_many, compare_trees, Change};
use trellis_refs::RefStore;
use trellis_store::ObjectStore;
use trellis_types::ObjectId;

use crate::error::GraphResult;
use crate::layout::{layout, Graph};
use crate::model::{Commit, CommitList, GraphRef};
use crate::simplify::simplify;
use crate::walk::walk;

/// Default bound on the number of commits walked.
pub const DEFAULT_MAX_COMMITS: usize = 200;

/// Lazily computed stages of the graph. `None` means not yet computed.
#[derive(Debug, Default)]
pub struct GraphCache {
    refs: Option<Vec<GraphRef>>,
    commits: Option<CommitList>,
    simplified: Option<CommitList>,
    graph: Option<Graph>,
}

impl GraphCache {
    pub fn invalidate_all(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_none()
            && self.commits.is_none()
            && self.simplified.is_none()
            && self.graph.is_none()
    }
}

pub struct RepositoryGraph {
    store: Arc<dyn ObjectStore>,
    refs: Arc<dyn RefStore>,
    max_commits: usize,
    simplified: bool,
    cache: GraphCache,
}

impl std::fmt::Debug for RepositoryGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryGraph")
            .field("max_commits", &self.max_commits)
            .field("simplified", &self.simplified)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl RepositoryGraph {
    pub fn new(store: Arc<dyn ObjectStore>, refs: Arc<dyn RefStore>) -> Self {
        Self {
            store,
            refs,
            max_commits: DEFAULT_MAX_COMMITS,
            simplified: false,
            cache: GraphCache::default(),
        }
    }

    pub fn with_max_commits(mut self, max_commits: usize) -> Self {
        self.max_commits = max_commits;
        self
    }

    pub fn max_commits(&self) -> usize {
        self.max_commits
    }

    pub fn is_simplified(&self) -> bool {
        self.simplified
    }

    /// Switch simplification on or off. Any change drops every cached stage.
    pub fn set_simplified(&mut self, simplified: bool) {
        if self.simplified != simplified {
            self.simplified = simplified;
            self.cache.invalidate_all();
        }
    }

    /// Drop every cached stage; the next query rereads the stores.
    pub fn invalidate_all(&mut self) {
        self.cache.invalidate_all();
    }

    pub fn cache(&self) -> &GraphCache {
        &self.cache
    }

    /// Every ref plus `HEAD`, sorted by name.
    pub fn refs(&mut self) -> GraphResult<&[GraphRef]> {
        if self.cache.refs.is_none() {
            let refs = self.load_refs()?;
            self.cache.refs = Some(refs);
        }
        Ok(self.cache.refs.get_or_insert_with(Vec::new))
    }

    /// The commits shown in the graph, simplified when that mode is on.
    pub fn commits(&mut self) -> GraphResult<&[Commit]> {
        self.ensure_commits()?;
        let list = if self.simplified {
            &self.cache.simplified
        } else {
            &self.cache.commits
        };
        Ok(list.as_ref().map(CommitList::as_slice).unwrap_or_default())
    }

    /// Node and link layout of [`commits`](Self::commits).
    pub fn graph(&mut self) -> GraphResult<&Graph> {
        if self.cache.graph.is_none() {
            self.ensure_commits()?;
            let refs = self.cache.refs.as_deref().unwrap_or_default();
            let list = if self.simplified {
                self.cache.simplified.as_ref()
            } else {
                self.cache.commits.as_ref()
            };
            let graph = list.map(|list| layout(list, refs)).unwrap_or_default();
            debug!(
                nodes = graph.nodes.len(),
                links = graph.links.len(),
                "laid out commit graph"
            );
            self.cache.graph = Some(graph);
        }
        Ok(self.cache.graph.get_or_insert_with(Graph::default))
    }

    /// Changes introduced by `commit` relative to its first parent.
    ///
    /// `None` for a root commit or an unknown id.
    pub fn changes(&self, commit: &ObjectId) -> GraphResult<Option<Vec<Change>>> {
        let Some(object) = self.store.read_commit(commit)? else {
            return Ok(None);
        };
        let Some(parent) = object.parents.first() else {
            return Ok(None);
        };
        let parent_tree = self.tree_of(parent)?;
        Ok(Some(compare_trees(
            self.store.as_ref(),
            Some(object.tree),
            parent_tree,
        )?))
    }

    /// Changes of `commit` against all of its parents at once.
    ///
    /// For a merge, a path is reported only where the merge differs from
    /// every parent. `None` for a root commit or an unknown id.
    pub fn merge_changes(&self, commit: &ObjectId) -> GraphResult<Option<Vec<Change>>> {
        let Some(object) = self.store.read_commit(commit)? else {
            return Ok(None);
        };
        if object.parents.is_empty() {
            return Ok(None);
        }
        let mut trees = vec![Some(object.tree)];
        for parent in &object.parents {
            trees.push(self.tree_of(parent)?);
        }
        Ok(Some(compare_many(self.store.as_ref(), &trees)?))
    }

    /// What changed going from `from` to `to`. `None` if either is unknown.
    pub fn changes_between(
        &self,
        from: &ObjectId,
        to: &ObjectId,
    ) -> GraphResult<Option<Vec<Change>>> {
        let (Some(from_tree), Some(to_tree)) = (self.tree_of(from)?, self.tree_of(to)?) else {
            return Ok(None);
        };
        Ok(Some(compare_trees(
            self.store.as_ref(),
            Some(to_tree),
            Some(from_tree),
        )?))
    }

    /// Content of the file at `path` in `commit`.
    ///
    /// `None` when the commit is unknown or the path is missing or is a
    /// directory.
    pub fn file_content_at(&self, commit: &ObjectId, path: &str) -> GraphResult<Option<Vec<u8>>> {
        let Some(tree) = self.tree_of(commit)? else {
            return Ok(None);
        };
        let Some(entry) = self.store.lookup_path(&tree, path)? else {
            return Ok(None);
        };
        if entry.is_tree() {
            return Ok(None);
        }
        Ok(self.store.read_blob(&entry.object_id)?.map(|blob| blob.data))
    }

    fn tree_of(&self, commit: &ObjectId) -> GraphResult<Option<ObjectId>> {
        Ok(self.store.read_commit(commit)?.map(|c| c.tree))
    }

    fn load_refs(&self) -> GraphResult<Vec<GraphRef>> {
        let mut refs: Vec<GraphRef> = self
            .refs
            .list_refs("")?
            .into_iter()
            .map(|(name, r)| GraphRef::new(name, r.target()))
            .collect();
        if let Some(head) = self.refs.resolve_head()? {
            refs.push(GraphRef::new("HEAD", head));
        }
        refs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(refs)
    }

    fn ensure_commits(&mut self) -> GraphResult<()> {
        if self.cache.refs.is_none() {
            self.cache.refs = Some(self.load_refs()?);
        }
        let refs = self.cache.refs.as_deref().unwrap_or_default();

        if self.cache.commits.is_none() {
            let mut tips: Vec<ObjectId> = refs.iter().map(|r| r.id).collect();
            tips.sort();
            tips.dedup();
            let list = walk(self.store.as_ref(), &tips, self.max_commits)?;
            if list.is_empty() && !tips.is_empty() {
                warn!(tips = tips.len(), "refs point at no readable commits");
            }
            self.cache.commits = Some(list);
        }

        if self.simplified && self.cache.simplified.is_none() {
            let full = self.cache.commits.as_ref();
            let simplified = full.map(|list| simplify(list, refs)).unwrap_or_default();
            self.cache.simplified = Some(simplified);
        }
        Ok(())
    }
}
