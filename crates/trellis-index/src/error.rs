//! Error types for the index crate.

use trellis_types::ObjectId;

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// An object referenced by the index was not found in the store.
    #[error("object not found in store: {0:?}")]
    ObjectNotFound(ObjectId),

    /// The entry has a conflict that must be resolved first.
    #[error("unresolved conflict at path: {0}")]
    UnresolvedConflict(String),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] trellis_store::StoreError),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An invalid path was provided.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
