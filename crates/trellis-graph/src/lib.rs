//! Commit graph for Trellis.
//!
//! Turns the refs and commits of a repository into rows and lanes for
//! drawing a branch/merge graph.
//!
//! # Pipeline
//!
//! 1. [`walk`] collects a bounded, newest-first, topologically consistent
//!    list of commits reachable from every ref and HEAD.
//! 2. [`simplify`] optionally collapses linear chains of unreferenced
//!    commits.
//! 3. [`layout`] assigns each commit a lane (x) and row (y) and links every
//!    commit to its children.
//!
//! [`RepositoryGraph`] ties the stages to an object store and ref store and
//! memoizes each one in a [`GraphCache`].

pub mod error;
pub mod layout;
pub mod model;
pub mod repository;
pub mod simplify;
pub mod walk;

pub use error::{GraphError, GraphResult};
pub use layout::{layout, Graph, GraphLink, GraphNode};
pub use model::{Commit, CommitList, GraphRef};
pub use repository::{GraphCache, RepositoryGraph, DEFAULT_MAX_COMMITS};
pub use simplify::simplify;
pub use walk::{walk, walk_at};
