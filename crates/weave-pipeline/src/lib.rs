//! Weave Pipeline: request-driven analysis wiring resolver, repository,
//! merger and store

pub mod collaborators;
pub mod message;
pub mod pipeline;


pub use collaborators::{GraphSink, PartialGraphProvider, RepositoryProvider, StoreSink};
pub use message::{AnalysisOutcome, AnalysisRequest, OutcomeStatus};
pub use pipeline::{AnalysisPipeline, CHANNEL_CAPACITY};
