//! Lane layout.
//!
//! Commits are placed one per row in list order. A lane is a column that
//! follows a line of first parents: a commit continues the lane of the
//! child that names it as first parent, and otherwise opens a new lane on
//! the right. A commit with several children resets the lanes, so it always
//! starts over in a fresh lane.
//!
//! Each commit is linked to every child that already has a node, from the
//! child's position to the commit's position.

use std::collections::HashMap;

use serde::Serialize;
use trellis_types::ObjectId;

use crate::model::{Commit, CommitList, GraphRef};

/// A commit placed in the graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    /// Lane.
    pub x: usize,
    /// Row.
    pub y: usize,
    pub id: ObjectId,
    pub message: String,
    pub committer_name: String,
    pub commit_date_relative: String,
    /// Refs pointing at this commit.
    pub refs: Vec<GraphRef>,
}

/// An edge from a child at `(x1, y1)` to its parent at `(x2, y2)`, tagged
/// with the parent's id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GraphLink {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
    pub id: ObjectId,
}

/// Nodes in row order plus the links between them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl Graph {
    /// Number of lanes in use.
    pub fn width(&self) -> usize {
        self.nodes.iter().map(|n| n.x + 1).max().unwrap_or(0)
    }
}

/// Lay out `commits` in rows and lanes.
pub fn layout(commits: &CommitList, refs: &[GraphRef]) -> Graph {
    let mut lanes: Vec<ObjectId> = Vec::new();
    let mut placed: HashMap<ObjectId, (usize, usize)> = HashMap::new();
    let mut graph = Graph::default();

    for (y, commit) in commits.iter().enumerate() {
        let mut children: Vec<&Commit> = Vec::with_capacity(commit.child_ids.len());
        for id in &commit.child_ids {
            if let Some(child) = commits.get(id) {
                if !children.iter().any(|c| c.id == *id) {
                    children.push(child);
                }
            }
        }

        let mut lane = None;
        if children.len() > 1 {
            lanes.clear();
        } else if let Some(child) = children
            .iter()
            .find(|c| c.parent_ids.first() == Some(&commit.id))
        {
            lane = lanes.iter().position(|id| *id == child.id);
        }

        let x = match lane {
            Some(x) => {
                lanes[x] = commit.id;
                x
            }
            None => {
                lanes.push(commit.id);
                lanes.len() - 1
            }
        };

        graph.nodes.push(GraphNode {
            x,
            y,
            id: commit.id,
            message: commit.message.clone(),
            committer_name: commit.committer_name.clone(),
            commit_date_relative: commit.commit_date_relative.clone(),
            refs: refs.iter().filter(|r| r.id == commit.id).cloned().collect(),
        });
        placed.insert(commit.id, (x, y));

        for child in &children {
            if let Some(&(x1, y1)) = placed.get(&child.id) {
                graph.links.push(GraphLink {
                    x1,
                    y1,
                    x2: x,
                    y2: y,
                    id: commit.id,
                });
            }
        }
    }
    graph
}
