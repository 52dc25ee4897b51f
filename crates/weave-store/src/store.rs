//! Graph store interface
//!
//! A store keeps one merged call graph per revision. Entries are
//! append-only: once a graph is stored for a revision it never changes.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use weave_core::{Coordinate, MergedCallGraph};

/// What a store knows about one entry without decoding the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredGraphMeta {
    pub coordinate: Coordinate,
    pub node_count: usize,
    pub edge_count: usize,
    pub stored_at: DateTime<Utc>,
}

impl StoredGraphMeta {
    pub fn describe(coordinate: &Coordinate, graph: &MergedCallGraph) -> Self {
        StoredGraphMeta {
            coordinate: coordinate.clone(),
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            stored_at: Utc::now(),
        }
    }
}

pub trait GraphStore: Send + Sync {
    /// Store the graph of a revision. Fails with `AlreadyExists` when the
    /// revision already has one.
    fn put(&self, revision: &Coordinate, graph: &MergedCallGraph) -> Result<(), StoreError>;

    fn get(&self, revision: &Coordinate) -> Result<MergedCallGraph, StoreError>;

    fn contains(&self, revision: &Coordinate) -> Result<bool, StoreError>;

    /// Metadata of every entry, sorted by coordinate.
    fn list(&self) -> Result<Vec<StoredGraphMeta>, StoreError>;
}

/// Stable key of a revision: `forge!group:artifact$version`.
pub fn revision_key(revision: &Coordinate) -> String {
    revision.qualified()
}
