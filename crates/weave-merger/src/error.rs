//! Merge error types

use thiserror::Error;
use weave_core::GraphError;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("unknown merge strategy '{0}', expected CHA or RTA-like")]
    UnknownStrategy(String),
    #[error("inconsistent merged graph: {0}")]
    Graph(#[from] GraphError),
    #[error("cannot export merged graph: {0}")]
    Export(#[from] serde_json::Error),
}
