//! Diff engine for Trellis.
//!
//! # Key Types
//!
//! - [`Change`] / [`ChangeKind`] -- path-level result of comparing trees
//! - [`compare_trees`] / [`compare_many`] -- two-way and N-way comparison
//! - [`BlobDiff`] / [`DiffHunk`] / [`DiffLine`] -- line-level content diff

pub mod blob_diff;
pub mod error;
pub mod tree_diff;

pub use blob_diff::{diff_blobs, BlobDiff, DiffHunk, DiffLine};
pub use error::{DiffError, DiffResult};
pub use tree_diff::{compare_many, compare_trees, Change, ChangeKind};
