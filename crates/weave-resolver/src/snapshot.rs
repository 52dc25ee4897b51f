//! Dependency graph snapshots
//!
//! Building the graph from a metadata source is the expensive part of
//! start-up, so a built graph can be written out with bincode and restored.
//! A snapshot is never refreshed; deciding when it is stale is up to the
//! caller.

use crate::error::SnapshotError;
use crate::graph::DependencyGraph;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use weave_core::{DependencyConstraint, Revision};

/// Bumped whenever the encoded layout changes.
pub const SNAPSHOT_FORMAT: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    format: u32,
    revisions: Vec<Revision>,
    constraints: Vec<DependencyConstraint>,
}

pub fn save_snapshot(graph: &DependencyGraph, path: &Path) -> Result<(), SnapshotError> {
    let io_err = |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let snapshot = Snapshot {
        format: SNAPSHOT_FORMAT,
        revisions: graph.revisions().into_iter().cloned().collect(),
        constraints: graph.constraints().to_vec(),
    };
    let file = File::create(path).map_err(io_err)?;
    bincode::serialize_into(BufWriter::new(file), &snapshot)?;
    tracing::info!(
        "Saved dependency graph snapshot to {} ({} revisions)",
        path.display(),
        snapshot.revisions.len()
    );
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<DependencyGraph, SnapshotError> {
    let file = File::open(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot: Snapshot = bincode::deserialize_from(BufReader::new(file))?;
    if snapshot.format != SNAPSHOT_FORMAT {
        return Err(SnapshotError::Format {
            found: snapshot.format,
            expected: SNAPSHOT_FORMAT,
        });
    }
    let graph = DependencyGraph::from_parts(snapshot.revisions, snapshot.constraints);
    tracing::info!(
        "Restored dependency graph from {}: {} revisions, {} constraints",
        path.display(),
        graph.revision_count(),
        graph.constraint_count()
    );
    Ok(graph)
}
