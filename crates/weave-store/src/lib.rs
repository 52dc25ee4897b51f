//! Weave Store: graph stores and the partial call graph repository

pub mod error;
pub mod fs;
pub mod integrity;
pub mod memory;
pub mod repository;
pub mod store;


#[cfg(test)]
pub mod test_utils;

pub use error::StoreError;
pub use fs::FsGraphStore;
pub use integrity::{IntegrityProblem, IntegrityReport, check_store};
pub use memory::MemoryGraphStore;
pub use repository::{AnalysisInput, PartialGraphRepository, read_partial_graph};
pub use store::{GraphStore, StoredGraphMeta, revision_key};
