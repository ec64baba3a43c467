//! Text rendering of the history graph and JSON views of SDK types.

use serde::Serialize;
use trellis_sdk::{Change, ChangedFile, Graph, GraphNode};

/// One row of `log --graph`: the lane columns followed by the node's text.
pub fn graph_rows(graph: &Graph, limit: usize) -> Vec<(String, &GraphNode)> {
    let width = graph.width();
    graph
        .nodes
        .iter()
        .take(limit)
        .map(|node| {
            let mut lanes = String::with_capacity(width * 2);
            for lane in 0..width {
                let mark = if lane == node.x {
                    '*'
                } else if passes_through(graph, lane, node.y) {
                    '|'
                } else {
                    ' '
                };
                lanes.push(mark);
                lanes.push(' ');
            }
            (lanes, node)
        })
        .collect()
}

/// A link is drawn down the outer of its two lanes between its end rows.
fn passes_through(graph: &Graph, lane: usize, row: usize) -> bool {
    graph
        .links
        .iter()
        .any(|l| l.y1 < row && row < l.y2 && l.x1.max(l.x2) == lane)
}

#[derive(Serialize)]
pub struct JsonChangedFile<'a> {
    pub path: &'a str,
    pub status: String,
    pub staged: bool,
}

impl<'a> From<&'a ChangedFile> for JsonChangedFile<'a> {
    fn from(f: &'a ChangedFile) -> Self {
        Self {
            path: &f.path,
            status: f.status.to_string(),
            staged: f.is_staged,
        }
    }
}

#[derive(Serialize)]
pub struct JsonChange<'a> {
    pub path: &'a str,
    pub kind: String,
}

impl<'a> From<&'a Change> for JsonChange<'a> {
    fn from(c: &'a Change) -> Self {
        Self {
            path: &c.path,
            kind: c.kind.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct JsonNode<'a> {
    pub x: usize,
    pub y: usize,
    pub id: String,
    pub message: &'a str,
    pub committer: &'a str,
    pub date: &'a str,
    pub refs: Vec<&'a str>,
}

#[derive(Serialize)]
pub struct JsonLink {
    pub from: (usize, usize),
    pub to: (usize, usize),
    pub id: String,
}

#[derive(Serialize)]
pub struct JsonGraph<'a> {
    pub nodes: Vec<JsonNode<'a>>,
    pub links: Vec<JsonLink>,
}

impl<'a> JsonGraph<'a> {
    pub fn new(graph: &'a Graph, limit: usize) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .take(limit)
            .map(|n| JsonNode {
                x: n.x,
                y: n.y,
                id: n.id.to_hex(),
                message: &n.message,
                committer: &n.committer_name,
                date: &n.commit_date_relative,
                refs: n.refs.iter().map(|r| r.name.as_str()).collect(),
            })
            .collect();
        let links = graph
            .links
            .iter()
            .filter(|l| l.y2 < limit)
            .map(|l| JsonLink {
                from: (l.x1, l.y1),
                to: (l.x2, l.y2),
                id: l.id.to_hex(),
            })
            .collect();
        Self { nodes, links }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_sdk::{GraphLink, ObjectId};

    fn node(x: usize, y: usize) -> GraphNode {
        GraphNode {
            x,
            y,
            id: ObjectId::from_bytes(format!("{x}/{y}").as_bytes()),
            message: format!("row {y}"),
            committer_name: "Ada".into(),
            commit_date_relative: "now".into(),
            refs: Vec::new(),
        }
    }

    fn link(x1: usize, y1: usize, x2: usize, y2: usize) -> GraphLink {
        GraphLink {
            x1,
            y1,
            x2,
            y2,
            id: ObjectId::null(),
        }
    }

    #[test]
    fn draws_branch_lanes() {
        // Row 0 merges rows 1 and 2; row 1 sits in lane 1 and joins row 3.
        let graph = Graph {
            nodes: vec![node(0, 0), node(1, 1), node(0, 2), node(0, 3)],
            links: vec![link(0, 0, 1, 1), link(0, 0, 0, 2), link(1, 1, 0, 3), link(0, 2, 0, 3)],
        };
        let rows: Vec<String> = graph_rows(&graph, 10).into_iter().map(|(l, _)| l).collect();
        assert_eq!(rows, vec!["*   ", "| * ", "* | ", "*   "]);
        assert_eq!(graph_rows(&graph, 2).len(), 2);
    }

    #[test]
    fn json_graph_uses_hex_ids() {
        let graph = Graph {
            nodes: vec![node(0, 0), node(0, 1)],
            links: vec![link(0, 0, 0, 1)],
        };
        let json = serde_json::to_value(JsonGraph::new(&graph, 1)).unwrap();
        assert_eq!(json["nodes"].as_array().unwrap().len(), 1);
        assert_eq!(json["links"].as_array().unwrap().len(), 0);
        assert_eq!(json["nodes"][0]["id"].as_str().unwrap().len(), 64);
    }
}
