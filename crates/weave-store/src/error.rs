//! Store error types

use std::path::PathBuf;
use thiserror::Error;
use weave_core::{ErrorClass, GraphError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no graph stored for {0}")]
    NotFound(String),
    /// Stored graphs are immutable; a second `put` for the same revision
    /// is refused.
    #[error("a graph for {0} is already stored")]
    AlreadyExists(String),
    #[error("storage unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed document {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("cannot encode or decode stored graph: {0}")]
    Codec(#[from] bincode::Error),
    #[error("stored graph is inconsistent: {0}")]
    Graph(#[from] GraphError),
}

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            StoreError::Malformed { .. } => ErrorClass::MergeInputMalformed,
            StoreError::NotFound(_) => ErrorClass::MissingRevision,
            _ => ErrorClass::StorageUnavailable,
        }
    }

    pub(crate) fn unavailable(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> StoreError {
        let path = path.into();
        move |source| StoreError::Unavailable { path, source }
    }
}
