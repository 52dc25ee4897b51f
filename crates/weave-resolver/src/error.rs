//! Resolver error types

use std::path::PathBuf;
use thiserror::Error;
use weave_core::{ArtifactKey, Coordinate, ErrorClass};

/// Failure of a metadata source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read metadata from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed metadata: {0}")]
    Json(#[from] serde_json::Error),
    #[error("metadata source unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The queried revision is not in the graph.
    #[error("unknown revision {0}")]
    UnknownRevision(Coordinate),
    /// A constraint points at an artifact with no known revisions.
    #[error("{source_revision} depends on {target}, which has no known revisions")]
    MissingRevision {
        source_revision: Coordinate,
        target: ArtifactKey,
    },
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl ResolveError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ResolveError::UnknownRevision(_) | ResolveError::MissingRevision { .. } => {
                ErrorClass::MissingRevision
            }
            ResolveError::Source(_) => ErrorClass::StorageUnavailable,
        }
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot encode or decode snapshot: {0}")]
    Codec(#[from] bincode::Error),
    #[error("unsupported snapshot format {found}, expected {expected}")]
    Format { found: u32, expected: u32 },
}
