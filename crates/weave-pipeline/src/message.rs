//! Pipeline messages

use serde::Serialize;
use weave_core::{Coordinate, Degradation};
use weave_merger::MergeReport;
use weave_resolver::effective_timestamp;
use weave_store::AnalysisInput;

/// One unit of work: merge the graph of `input` with its dependencies.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub id: u64,
    pub input: AnalysisInput,
    /// Resolve dependencies as of this release timestamp.
    pub at: Option<i64>,
}

impl AnalysisRequest {
    pub fn new(id: u64, input: AnalysisInput) -> Self {
        AnalysisRequest { id, input, at: None }
    }

    /// Zero or below leaves resolution unbounded.
    pub fn at(mut self, timestamp: i64) -> Self {
        self.at = effective_timestamp(Some(timestamp));
        self
    }
}

/// Published once per request.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub id: u64,
    /// The request input as given.
    pub input: String,
    /// Coordinate of the analyzed artifact, once known.
    pub coordinate: Option<Coordinate>,
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum OutcomeStatus {
    /// The merged graph was written to the store.
    Stored {
        report: MergeReport,
        /// Resolved dependencies without a partial graph in the repository.
        missing: Vec<Coordinate>,
        resolution: Vec<Degradation>,
    },
    /// The store already holds a graph for the revision.
    AlreadyStored,
    Failed { error: String },
}

impl AnalysisOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self.status, OutcomeStatus::Stored { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }
}
