//! Dependency graph construction and transitive resolution

pub mod batch;
pub mod error;
pub mod graph;
pub mod resolve;
pub mod seed;
pub mod snapshot;
pub mod source;

#[cfg(test)]
pub mod tests;

#[cfg(test)]
pub mod test_utils;

pub use batch::{resolve_batch, BatchMode, BatchSummary};
pub use error::{ResolveError, SnapshotError, SourceError};
pub use graph::DependencyGraph;
pub use resolve::{effective_timestamp, Resolution, ResolveOptions, Resolver};
pub use seed::{RevisionGraph, SeedSelection, SeedStat};
pub use snapshot::{load_snapshot, save_snapshot, SNAPSHOT_FORMAT};
pub use source::{InMemoryMetadataSource, JsonMetadataSource, MetadataSource};
