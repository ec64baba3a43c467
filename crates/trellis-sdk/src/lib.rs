//! High-level SDK for Trellis.
//!
//! [`Tracker`] is the entry point for applications: it opens the repository
//! enclosing a folder and answers file status, staging, commit and history
//! queries over it.

pub mod config;
pub mod error;
pub mod paths;
pub mod tracker;

pub use config::{GraphConfig, RepoConfig, StatusConfig, UserConfig};
pub use error::{SdkError, SdkResult};
pub use paths::{discover, relative_path, RepoPaths};
pub use tracker::Tracker;

// Re-export key types
pub use trellis_diff::{Change, ChangeKind};
pub use trellis_graph::{Commit, Graph, GraphLink, GraphNode, GraphRef};
pub use trellis_status::{ChangedFile, FileStatus};
pub use trellis_types::{relative_date, ObjectId};
