//! Call graph merger
//!
//! Stitches the partial call graph of one artifact together with the
//! partial call graphs of its resolved dependencies into a single graph with
//! global IDs, resolving virtual and interface call sites against the merged
//! class hierarchy.

pub mod check;
pub mod dispatch;
pub mod error;
pub mod jcg;
pub mod merger;
pub mod report;
pub mod strategy;
pub mod universe;


#[cfg(test)]
pub mod test_utils;

pub use check::{UriCheck, check_uris, missing_calls};
pub use error::MergeError;
pub use jcg::{JcgDocument, JcgMethod, to_jcg};
pub use merger::{CallGraphMerger, MergeOptions, MergeOutcome, merge};
pub use report::MergeReport;
pub use strategy::{Strategy, TargetFilter, create_filter};
pub use universe::Universe;
