//! Error types for status computation.

/// Errors that can occur while computing file status.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("store error: {0}")]
    Store(#[from] trellis_store::StoreError),

    #[error("index error: {0}")]
    Index(#[from] trellis_index::IndexError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StatusResult<T> = Result<T, StatusError>;
