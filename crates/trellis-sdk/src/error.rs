use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("repository already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] trellis_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] trellis_refs::RefError),

    #[error("index error: {0}")]
    Index(#[from] trellis_index::IndexError),

    #[error("status error: {0}")]
    Status(#[from] trellis_status::StatusError),

    #[error("graph error: {0}")]
    Graph(#[from] trellis_graph::GraphError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
