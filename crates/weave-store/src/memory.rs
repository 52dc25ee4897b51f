//! In-memory graph store

use crate::error::StoreError;
use crate::store::{GraphStore, StoredGraphMeta, revision_key};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use weave_core::{Coordinate, MergedCallGraph};

#[derive(Default)]
pub struct MemoryGraphStore {
    graphs: DashMap<String, (StoredGraphMeta, MergedCallGraph)>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

impl GraphStore for MemoryGraphStore {
    fn put(&self, revision: &Coordinate, graph: &MergedCallGraph) -> Result<(), StoreError> {
        match self.graphs.entry(revision_key(revision)) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(revision.to_string())),
            Entry::Vacant(slot) => {
                slot.insert((StoredGraphMeta::describe(revision, graph), graph.clone()));
                tracing::debug!("Stored graph for {} in memory", revision);
                Ok(())
            }
        }
    }

    fn get(&self, revision: &Coordinate) -> Result<MergedCallGraph, StoreError> {
        self.graphs
            .get(&revision_key(revision))
            .map(|entry| entry.value().1.clone())
            .ok_or_else(|| StoreError::NotFound(revision.to_string()))
    }

    fn contains(&self, revision: &Coordinate) -> Result<bool, StoreError> {
        Ok(self.graphs.contains_key(&revision_key(revision)))
    }

    fn list(&self) -> Result<Vec<StoredGraphMeta>, StoreError> {
        let mut metas: Vec<StoredGraphMeta> =
            self.graphs.iter().map(|entry| entry.value().0.clone()).collect();
        metas.sort_by(|a, b| a.coordinate.cmp(&b.coordinate));
        Ok(metas)
    }
}
