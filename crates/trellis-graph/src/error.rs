//! Error types for the commit graph.

/// Errors that can occur while building or querying the commit graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Reading commits or trees failed.
    #[error("store error: {0}")]
    Store(#[from] trellis_store::StoreError),

    /// Listing or resolving refs failed.
    #[error("ref error: {0}")]
    Refs(#[from] trellis_refs::RefError),

    /// Comparing commit trees failed.
    #[error("diff error: {0}")]
    Diff(#[from] trellis_diff::DiffError),
}

/// Convenience alias for graph results.
pub type GraphResult<T> = Result<T, GraphError>;
