//! Graph-side views of commits and refs.
//!
//! A [`CommitList`] is an arena: commits sit in a `Vec` in display order and
//! an id index maps each id to its slot. Relations between commits are id
//! lists, never references. Parent ids come from the stored commit; child
//! ids are derived and recomputed from the parent edges whenever the list
//! changes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use trellis_store::CommitObject;
use trellis_types::{relative_date, ObjectId};

/// A commit as shown in the graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub id: ObjectId,
    /// Parent ids, first parent first.
    pub parent_ids: Vec<ObjectId>,
    /// Ids of the commits in the same list that name this one as a parent.
    pub child_ids: Vec<ObjectId>,
    pub author_name: String,
    pub author_email: String,
    pub committer_name: String,
    pub committer_email: String,
    pub commit_time: DateTime<Utc>,
    /// `commit_time` rendered relative to when the list was built.
    pub commit_date_relative: String,
    /// First line of the message.
    pub message: String,
}

impl Commit {
    pub fn from_object(id: ObjectId, object: &CommitObject, now: DateTime<Utc>) -> Self {
        Self {
            id,
            parent_ids: object.parents.clone(),
            child_ids: Vec::new(),
            author_name: object.author.name.clone(),
            author_email: object.author.email.clone(),
            committer_name: object.committer.name.clone(),
            committer_email: object.committer.email.clone(),
            commit_time: object.committer.when,
            commit_date_relative: relative_date(object.committer.when, now),
            message: object.short_message().to_string(),
        }
    }
}

/// A named pointer at a commit. `HEAD` is listed alongside canonical ref
/// names such as `refs/heads/main`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GraphRef {
    pub name: String,
    pub id: ObjectId,
}

impl GraphRef {
    pub fn new(name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    /// The name without its `refs/heads/`, `refs/tags/` or `refs/remotes/`
    /// prefix.
    pub fn short_name(&self) -> &str {
        ["refs/heads/", "refs/tags/", "refs/remotes/"]
            .iter()
            .find_map(|prefix| self.name.strip_prefix(prefix))
            .unwrap_or(&self.name)
    }
}

/// An ordered list of commits with an id index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitList {
    commits: Vec<Commit>,
    index: HashMap<ObjectId, usize>,
}

impl CommitList {
    /// Build a list, keeping the given order and deriving child ids.
    ///
    /// A repeated id keeps its first occurrence.
    pub fn new(commits: Vec<Commit>) -> Self {
        let mut list = Self::default();
        for commit in commits {
            if list.index.contains_key(&commit.id) {
                continue;
            }
            list.index.insert(commit.id, list.commits.len());
            list.commits.push(commit);
        }
        list.recompute_children();
        list
    }

    /// Build a list whose parent and child ids are already consistent,
    /// keeping them exactly as given.
    pub(crate) fn from_linked(commits: Vec<Commit>) -> Self {
        let index = commits.iter().enumerate().map(|(i, c)| (c.id, i)).collect();
        Self { commits, index }
    }

    /// Reset every commit's child ids from the parent edges in the list.
    /// Children appear in list order.
    pub fn recompute_children(&mut self) {
        for commit in &mut self.commits {
            commit.child_ids.clear();
        }
        for child in 0..self.commits.len() {
            let child_id = self.commits[child].id;
            for p in 0..self.commits[child].parent_ids.len() {
                let parent_id = self.commits[child].parent_ids[p];
                if let Some(&slot) = self.index.get(&parent_id) {
                    let children = &mut self.commits[slot].child_ids;
                    if !children.contains(&child_id) {
                        children.push(child_id);
                    }
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn get(&self, id: &ObjectId) -> Option<&Commit> {
        self.index.get(id).map(|&i| &self.commits[i])
    }

    pub fn position(&self, id: &ObjectId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.index.contains_key(id)
    }

    pub fn as_slice(&self) -> &[Commit] {
        &self.commits
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Commit> {
        self.commits.iter()
    }

    pub fn into_vec(self) -> Vec<Commit> {
        self.commits
    }
}

impl<'a> IntoIterator for &'a CommitList {
    type Item = &'a Commit;
    type IntoIter = std::slice::Iter<'a, Commit>;

    fn into_iter(self) -> Self::IntoIter {
        self.commits.iter()
    }
}

/// Test helpers for building commits by hand.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn id(n: u32) -> ObjectId {
        ObjectId::from_bytes(format!("commit-{n}").as_bytes())
    }

    /// Commit `n` with the given parents, timestamped `n` minutes after a
    /// fixed epoch.
    pub fn commit(n: u32, parents: &[u32]) -> Commit {
        let when = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::minutes(i64::from(n));
        Commit {
            id: id(n),
            parent_ids: parents.iter().map(|&p| id(p)).collect(),
            child_ids: Vec::new(),
            author_name: "Ada".into(),
            author_email: "ada@example.com".into(),
            committer_name: "Ada".into(),
            committer_email: "ada@example.com".into(),
            commit_time: when,
            commit_date_relative: String::new(),
            message: format!("C{n}"),
        }
    }

    /// A list from `(n, parents)` pairs, in the given order.
    pub fn list(spec: &[(u32, &[u32])]) -> CommitList {
        CommitList::new(spec.iter().map(|(n, p)| commit(*n, p)).collect())
    }
}
