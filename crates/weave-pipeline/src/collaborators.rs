//! Async collaborators of the pipeline
//!
//! The repository and the stores are synchronous and touch the disk, so
//! their adapters move the work onto the blocking pool.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use weave_core::{Coordinate, MergedCallGraph, PartialCallGraph};
use weave_store::{AnalysisInput, GraphStore, PartialGraphRepository};

/// Supplies partial call graphs.
#[async_trait]
pub trait PartialGraphProvider: Send + Sync {
    async fn fetch(&self, input: &AnalysisInput) -> Result<PartialCallGraph>;

    /// Graphs of the given coordinates, plus the coordinates with no graph.
    async fn fetch_all(&self, coordinates: &[Coordinate]) -> Result<(Vec<PartialCallGraph>, Vec<Coordinate>)>;
}

/// Receives merged call graphs.
#[async_trait]
pub trait GraphSink: Send + Sync {
    async fn contains(&self, revision: &Coordinate) -> Result<bool>;

    async fn store(&self, revision: &Coordinate, graph: MergedCallGraph) -> Result<()>;
}

pub struct RepositoryProvider {
    repository: Arc<PartialGraphRepository>,
}

impl RepositoryProvider {
    pub fn new(repository: Arc<PartialGraphRepository>) -> Self {
        RepositoryProvider { repository }
    }
}

#[async_trait]
impl PartialGraphProvider for RepositoryProvider {
    async fn fetch(&self, input: &AnalysisInput) -> Result<PartialCallGraph> {
        let repository = Arc::clone(&self.repository);
        let owned = input.clone();
        tokio::task::spawn_blocking(move || repository.load_input(&owned))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
            .with_context(|| format!("loading partial call graph of {}", input))
    }

    async fn fetch_all(&self, coordinates: &[Coordinate]) -> Result<(Vec<PartialCallGraph>, Vec<Coordinate>)> {
        let repository = Arc::clone(&self.repository);
        let owned = coordinates.to_vec();
        tokio::task::spawn_blocking(move || repository.load_available(&owned))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
            .context("loading dependency call graphs")
    }
}

pub struct StoreSink {
    store: Arc<dyn GraphStore>,
}

impl StoreSink {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        StoreSink { store }
    }
}

#[async_trait]
impl GraphSink for StoreSink {
    async fn contains(&self, revision: &Coordinate) -> Result<bool> {
        let store = Arc::clone(&self.store);
        let revision = revision.clone();
        tokio::task::spawn_blocking(move || store.contains(&revision))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
            .context("querying graph store")
    }

    async fn store(&self, revision: &Coordinate, graph: MergedCallGraph) -> Result<()> {
        let store = Arc::clone(&self.store);
        let owned = revision.clone();
        tokio::task::spawn_blocking(move || store.put(&owned, &graph))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
            .with_context(|| format!("storing merged graph of {}", revision))
    }
}
