//! A status and history session over one working tree.
//!
//! [`Tracker`] owns everything a front end needs: the repository stores, the
//! staging index, the status cache and the commit graph. Outside a
//! repository every query answers with its empty value instead of failing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use trellis_diff::{diff_blobs, Change};
use trellis_graph::{Commit, Graph, GraphRef, RepositoryGraph};
use trellis_index::Index;
use trellis_refs::{FileRefStore, Head, RefStore};
use trellis_status::{
    ChangedFile, FileStatus, FsWorkdir, GitignoreMatcher, Snapshot, StatusCache, Workdir,
};
use trellis_store::{CommitObject, FileObjectStore, ObjectStore};
use trellis_types::{ObjectId, Signature};

use crate::config::RepoConfig;
use crate::error::{SdkError, SdkResult};
use crate::paths::{self, RepoPaths};

/// Everything loaded from an open repository.
struct Session {
    paths: RepoPaths,
    config: RepoConfig,
    store: Arc<dyn ObjectStore>,
    refs: Arc<dyn RefStore>,
    index: Index,
    head_tree: Option<ObjectId>,
    workdir: FsWorkdir,
    ignore: GitignoreMatcher,
    graph: RepositoryGraph,
}

impl Session {
    fn open(work_dir: PathBuf) -> SdkResult<Self> {
        let paths = RepoPaths::new(work_dir);
        let config = RepoConfig::load(&paths.config())?;
        let store: Arc<dyn ObjectStore> = Arc::new(FileObjectStore::open(paths.objects())?);
        let refs: Arc<dyn RefStore> = Arc::new(FileRefStore::open(paths.refs()));
        let index = Index::load(store.clone(), paths.index())?;

        let head_tree = match refs.resolve_head()? {
            Some(head) => match store.read_commit(&head)? {
                Some(commit) => Some(commit.tree),
                None => {
                    warn!(head = %head.short_hex(), "HEAD names a missing commit");
                    None
                }
            },
            None => None,
        };

        let workdir = FsWorkdir::new(paths.work_dir());
        let ignore = GitignoreMatcher::load(paths.work_dir(), &config.status.ignore_file);
        let mut graph = RepositoryGraph::new(store.clone(), refs.clone())
            .with_max_commits(config.graph.max_commits);
        graph.set_simplified(config.graph.simplify);

        Ok(Self {
            paths,
            config,
            store,
            refs,
            index,
            head_tree,
            workdir,
            ignore,
            graph,
        })
    }

    fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            store: self.store.as_ref(),
            head_tree: self.head_tree,
            index: &self.index,
            workdir: &self.workdir,
            ignore: &self.ignore,
        }
    }

    /// Repository-relative form of `path`, which may be absolute or
    /// relative to the working tree.
    fn repo_path(&self, path: &Path) -> Option<String> {
        let snap = self.snapshot();
        snap.relative(path).or_else(|| {
            if path.is_absolute() {
                snap.relative(&paths::canonical(path))
            } else {
                None
            }
        })
    }

    fn head_commit(&self) -> SdkResult<Option<(ObjectId, CommitObject)>> {
        let Some(id) = self.refs.resolve_head()? else {
            return Ok(None);
        };
        Ok(self.store.read_commit(&id)?.map(|c| (id, c)))
    }

    fn head_content(&self, rel: &str) -> SdkResult<Option<Vec<u8>>> {
        let Some(tree) = self.head_tree else {
            return Ok(None);
        };
        let Some(entry) = self.store.lookup_path(&tree, rel)? else {
            return Ok(None);
        };
        if entry.is_tree() {
            return Ok(None);
        }
        Ok(self.store.read_blob(&entry.object_id)?.map(|b| b.data))
    }

    fn signature(&self) -> Signature {
        Signature::now(&self.config.user.name, &self.config.user.email)
    }

    /// Point the checked-out branch (or a detached HEAD) at `commit`.
    fn advance_head(&self, commit: ObjectId) -> SdkResult<()> {
        match self.refs.head()? {
            Some(Head::Symbolic(branch)) => {
                let name = format!("refs/heads/{branch}");
                self.refs
                    .write_ref(&name, &trellis_refs::Ref::branch(&branch, commit))?;
            }
            Some(Head::Detached(_)) => self.refs.set_head_detached(commit)?,
            None => {
                self.refs
                    .write_ref("refs/heads/main", &trellis_refs::Ref::branch("main", commit))?;
                self.refs.set_head("main")?;
            }
        }
        Ok(())
    }
}

/// A session over the repository enclosing a folder.
pub struct Tracker {
    start: PathBuf,
    session: Option<Session>,
    cache: StatusCache,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("start", &self.start)
            .field("work_dir", &self.work_dir())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl std::fmt::Display for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.work_dir() {
            Some(dir) => write!(f, "{}", dir.display()),
            None => f.write_str("[no repo]"),
        }
    }
}

impl Tracker {
    /// Open the repository enclosing `folder`, searching upwards.
    ///
    /// Finding no repository is not an error: the tracker answers every
    /// query with an empty result until a repository appears and
    /// [`refresh`](Self::refresh) is called.
    pub fn open(folder: impl AsRef<Path>) -> SdkResult<Self> {
        let mut tracker = Self {
            start: folder.as_ref().to_path_buf(),
            session: None,
            cache: StatusCache::new(),
        };
        tracker.refresh()?;
        Ok(tracker)
    }

    /// Create an empty repository in `folder` (HEAD on an unborn `main`)
    /// and open it.
    pub fn init(folder: impl AsRef<Path>) -> SdkResult<Self> {
        let folder = folder.as_ref();
        std::fs::create_dir_all(folder)?;
        let paths = RepoPaths::new(std::fs::canonicalize(folder)?);
        if paths.meta_dir().is_dir() {
            return Err(SdkError::AlreadyInitialized(paths.work_dir().to_path_buf()));
        }

        std::fs::create_dir_all(paths.objects())?;
        RepoConfig::default().save(&paths.config())?;
        FileRefStore::open(paths.refs()).set_head("main")?;
        let store: Arc<dyn ObjectStore> = Arc::new(FileObjectStore::open(paths.objects())?);
        Index::load(store, paths.index())?.write()?;
        info!(path = %paths.work_dir().display(), "initialized repository");

        Self::open(paths.work_dir())
    }

    /// Reload HEAD, the index, ignore rules and config from disk and drop
    /// every cached status and graph.
    pub fn refresh(&mut self) -> SdkResult<()> {
        self.cache.invalidate();
        let simplified = self.session.as_ref().map(|s| s.graph.is_simplified());
        self.session = None;

        let Some(work_dir) = paths::discover(&self.start) else {
            debug!(start = %self.start.display(), "no repository found");
            return Ok(());
        };
        let mut session = Session::open(work_dir)?;
        if let Some(simplified) = simplified {
            session.graph.set_simplified(simplified);
        }
        info!(work_dir = %session.paths.work_dir().display(), "opened repository");
        self.session = Some(session);
        Ok(())
    }

    pub fn has_repository(&self) -> bool {
        self.session.is_some()
    }

    pub fn work_dir(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.paths.work_dir())
    }

    pub fn config(&self) -> Option<&RepoConfig> {
        self.session.as_ref().map(|s| &s.config)
    }

    /// Path of `path` relative to the working tree, `None` outside it.
    pub fn relative_path(&self, path: &Path) -> Option<String> {
        self.session.as_ref()?.repo_path(path)
    }

    /// The checked-out branch; `None` outside a repository or when HEAD is
    /// detached.
    pub fn current_branch(&self) -> SdkResult<Option<String>> {
        match &self.session {
            Some(s) => Ok(s.refs.current_branch()?),
            None => Ok(None),
        }
    }

    /// Full message of the HEAD commit, empty before the first commit.
    pub fn last_commit_message(&self) -> SdkResult<Option<String>> {
        let Some(session) = &self.session else {
            return Ok(None);
        };
        Ok(Some(
            session
                .head_commit()?
                .map(|(_, c)| c.message)
                .unwrap_or_default(),
        ))
    }

    pub fn head(&self) -> SdkResult<Option<ObjectId>> {
        match &self.session {
            Some(s) => Ok(s.refs.resolve_head()?),
            None => Ok(None),
        }
    }

    /// Parent ids of `commit`, first parent first; `None` when it is not a
    /// stored commit.
    pub fn parents(&self, commit: &ObjectId) -> SdkResult<Option<Vec<ObjectId>>> {
        match &self.session {
            Some(s) => Ok(s.store.read_commit(commit)?.map(|c| c.parents)),
            None => Ok(None),
        }
    }

    /// Resolve a revision (`HEAD`, a ref name, an id or id prefix).
    pub fn resolve(&self, spec: &str) -> SdkResult<Option<ObjectId>> {
        match &self.session {
            Some(s) => Ok(trellis_refs::resolve(s.refs.as_ref(), s.store.as_ref(), spec)?),
            None => Ok(None),
        }
    }

    // ---------------------------------------------------------------
    // Status
    // ---------------------------------------------------------------

    /// Status of one file, memoized until the next refresh.
    pub fn file_status(&mut self, path: &Path) -> SdkResult<FileStatus> {
        let Some(session) = &self.session else {
            return Ok(FileStatus::NotControlled);
        };
        let Some(rel) = session.repo_path(path) else {
            return Ok(FileStatus::NotControlled);
        };
        Ok(self.cache.get(&session.snapshot(), Path::new(&rel))?)
    }

    /// Every changed file in path order, from one sweep of the tree, index
    /// and working directory.
    pub fn changed_files(&mut self) -> SdkResult<&[ChangedFile]> {
        let Some(session) = &self.session else {
            return Ok(&[]);
        };
        Ok(self.cache.changed_files(&session.snapshot())?)
    }

    /// Stage the file at `path`, or stage its deletion when it is gone.
    pub fn stage(&mut self, path: &Path) -> SdkResult<()> {
        let Some(session) = &mut self.session else {
            return Ok(());
        };
        let rel = require_repo_path(session, path)?;
        session.index.reread_if_stale()?;

        match session.workdir.metadata(&rel)? {
            Some(meta) => {
                let content = session.workdir.read(&rel)?;
                let mtime = meta.mtime.unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                session.index.add(&rel, &content, meta.mode, mtime)?;
            }
            None => {
                session.index.remove(&rel);
            }
        }
        session.index.write()?;
        let status = self.cache.update(&session.snapshot(), Path::new(&rel))?;
        debug!(path = %rel, %status, "staged");
        Ok(())
    }

    /// Reset the index entry for `path` to the last commit.
    pub fn unstage(&mut self, path: &Path) -> SdkResult<()> {
        let Some(session) = &mut self.session else {
            return Ok(());
        };
        let rel = require_repo_path(session, path)?;
        session.index.reread_if_stale()?;

        session.index.remove(&rel);
        if let Some(tree) = session.head_tree {
            session.index.add_entry_from_tree(&rel, &tree)?;
        }
        session.index.write()?;
        let status = self.cache.update(&session.snapshot(), Path::new(&rel))?;
        debug!(path = %rel, %status, "unstaged");
        Ok(())
    }

    /// Drop `path` from the index. The file on disk is left alone.
    pub fn remove(&mut self, path: &Path) -> SdkResult<()> {
        let Some(session) = &mut self.session else {
            return Ok(());
        };
        let rel = require_repo_path(session, path)?;
        session.index.reread_if_stale()?;
        session.index.remove(&rel);
        session.index.write()?;
        let status = self.cache.update(&session.snapshot(), Path::new(&rel))?;
        debug!(path = %rel, %status, "removed from index");
        Ok(())
    }

    /// Unified diff of the working copy of `path` against the last commit.
    ///
    /// Empty when nothing differs, outside a repository, or when either
    /// side cannot be read.
    pub fn diff_file(&self, path: &Path) -> String {
        let Some(session) = &self.session else {
            return String::new();
        };
        let Some(rel) = session.repo_path(path) else {
            return String::new();
        };

        let old = match session.head_content(&rel) {
            Ok(content) => content.unwrap_or_default(),
            Err(e) => {
                warn!(path = %rel, error = %e, "cannot read committed content");
                return String::new();
            }
        };
        let new = match session.workdir.metadata(&rel) {
            Ok(Some(_)) => match session.workdir.read(&rel) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %rel, error = %e, "cannot read working file");
                    return String::new();
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(path = %rel, error = %e, "cannot stat working file");
                return String::new();
            }
        };
        diff_blobs(&old, &new).to_unified(&rel, &rel)
    }

    /// Content of `path` in the last commit.
    pub fn head_content(&self, path: &Path) -> Option<Vec<u8>> {
        let session = self.session.as_ref()?;
        let rel = session.repo_path(path)?;
        session.head_content(&rel).unwrap_or_else(|e| {
            warn!(path = %rel, error = %e, "cannot read committed content");
            None
        })
    }

    // ---------------------------------------------------------------
    // Commits
    // ---------------------------------------------------------------

    /// Commit the index on top of HEAD and refresh.
    ///
    /// Returns the new commit id, `None` outside a repository.
    pub fn commit(&mut self, message: &str) -> SdkResult<Option<ObjectId>> {
        require_message(message)?;
        let Some(session) = &self.session else {
            return Ok(None);
        };
        let tree = session.index.write_tree()?;
        let parents = match session.head_commit()? {
            Some((id, _)) => vec![id],
            None => Vec::new(),
        };
        let signature = session.signature();
        let id = session.store.write_commit(&CommitObject {
            tree,
            parents,
            author: signature.clone(),
            committer: signature,
            message: message.to_string(),
        })?;
        session.advance_head(id)?;
        info!(commit = %id.short_hex(), "committed");
        self.refresh()?;
        Ok(Some(id))
    }

    /// Replace the HEAD commit with one built from the index, keeping its
    /// parents and author.
    pub fn amend_commit(&mut self, message: &str) -> SdkResult<Option<ObjectId>> {
        require_message(message)?;
        let Some(session) = &self.session else {
            return Ok(None);
        };
        let Some((_, head)) = session.head_commit()? else {
            return Err(SdkError::InvalidArgument("no commit to amend".into()));
        };
        let tree = session.index.write_tree()?;
        let id = session.store.write_commit(&CommitObject {
            tree,
            parents: head.parents,
            author: head.author,
            committer: session.signature(),
            message: message.to_string(),
        })?;
        session.advance_head(id)?;
        info!(commit = %id.short_hex(), "amended");
        self.refresh()?;
        Ok(Some(id))
    }

    // ---------------------------------------------------------------
    // History
    // ---------------------------------------------------------------

    pub fn is_simplified(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.graph.is_simplified())
    }

    /// Turn chain simplification on or off for the graph queries.
    pub fn set_simplified(&mut self, simplified: bool) {
        if let Some(session) = &mut self.session {
            session.graph.set_simplified(simplified);
        }
    }

    /// Nodes and links of the history graph, memoized until refresh.
    pub fn graph(&mut self) -> SdkResult<Option<&Graph>> {
        match &mut self.session {
            Some(s) => Ok(Some(s.graph.graph()?)),
            None => Ok(None),
        }
    }

    pub fn commits(&mut self) -> SdkResult<&[Commit]> {
        match &mut self.session {
            Some(s) => Ok(s.graph.commits()?),
            None => Ok(&[]),
        }
    }

    pub fn refs(&mut self) -> SdkResult<&[GraphRef]> {
        match &mut self.session {
            Some(s) => Ok(s.graph.refs()?),
            None => Ok(&[]),
        }
    }

    /// Changes introduced by `commit` against its first parent.
    pub fn changes(&self, commit: &str) -> SdkResult<Option<Vec<Change>>> {
        let (Some(s), Some(id)) = (&self.session, self.resolve(commit)?) else {
            return Ok(None);
        };
        Ok(s.graph.changes(&id)?)
    }

    /// Changes of `commit` against all of its parents.
    pub fn merge_changes(&self, commit: &str) -> SdkResult<Option<Vec<Change>>> {
        let (Some(s), Some(id)) = (&self.session, self.resolve(commit)?) else {
            return Ok(None);
        };
        Ok(s.graph.merge_changes(&id)?)
    }

    /// What changed going from `from` to `to`.
    pub fn changes_between(&self, from: &str, to: &str) -> SdkResult<Option<Vec<Change>>> {
        let Some(s) = &self.session else {
            return Ok(None);
        };
        let (Some(from), Some(to)) = (self.resolve(from)?, self.resolve(to)?) else {
            return Ok(None);
        };
        Ok(s.graph.changes_between(&from, &to)?)
    }

    /// Content of `path` (repository-relative) in `commit`.
    pub fn file_content_at(&self, commit: &str, path: &str) -> SdkResult<Option<Vec<u8>>> {
        let (Some(s), Some(id)) = (&self.session, self.resolve(commit)?) else {
            return Ok(None);
        };
        Ok(s.graph.file_content_at(&id, path)?)
    }
}

fn require_message(message: &str) -> SdkResult<()> {
    if message.is_empty() {
        return Err(SdkError::InvalidArgument(
            "commit message must not be empty".into(),
        ));
    }
    Ok(())
}

fn require_repo_path(session: &Session, path: &Path) -> SdkResult<String> {
    session.repo_path(path).ok_or_else(|| {
        SdkError::InvalidArgument(format!("{} is outside the working tree", path.display()))
    })
}
