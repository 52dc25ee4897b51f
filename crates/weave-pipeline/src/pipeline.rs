//! Producer/consumer analysis pipeline
//!
//! Requests arrive over an `mpsc` channel and are handled one at a time.
//! For each request the pipeline loads the base partial graph, resolves its
//! dependencies, loads their partial graphs, merges, and stores the result.
//! Resolution and merging are CPU-bound and run on the blocking pool.
//! Every request yields exactly one [`AnalysisOutcome`] on the broadcast
//! channel, including failures.

use crate::collaborators::{GraphSink, PartialGraphProvider};
use crate::message::{AnalysisOutcome, AnalysisRequest, OutcomeStatus};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use weave_core::{Coordinate, Degradation, ErrorClass};
use weave_merger::{CallGraphMerger, MergeOptions};
use weave_resolver::{DependencyGraph, ResolveError, ResolveOptions, Resolver};

/// Default capacity of the request and outcome channels.
pub const CHANNEL_CAPACITY: usize = 64;

pub struct AnalysisPipeline {
    graph: Arc<DependencyGraph>,
    resolve_options: ResolveOptions,
    merge_options: MergeOptions,
    provider: Arc<dyn PartialGraphProvider>,
    sink: Arc<dyn GraphSink>,
    outcomes: broadcast::Sender<AnalysisOutcome>,
}

impl AnalysisPipeline {
    pub fn new(
        graph: Arc<DependencyGraph>,
        provider: Arc<dyn PartialGraphProvider>,
        sink: Arc<dyn GraphSink>,
    ) -> Self {
        let (outcomes, _) = broadcast::channel(CHANNEL_CAPACITY);
        AnalysisPipeline {
            graph,
            resolve_options: ResolveOptions::default(),
            merge_options: MergeOptions::default(),
            provider,
            sink,
            outcomes,
        }
    }

    pub fn with_resolve_options(mut self, options: ResolveOptions) -> Self {
        self.resolve_options = options;
        self
    }

    pub fn with_merge_options(mut self, options: MergeOptions) -> Self {
        self.merge_options = options;
        self
    }

    /// Subscribe to outcomes. Only outcomes published after subscribing
    /// are received.
    pub fn subscribe(&self) -> broadcast::Receiver<AnalysisOutcome> {
        self.outcomes.subscribe()
    }

    /// Start consuming requests on a background task. The task ends once
    /// every sender is dropped and returns the number of requests handled.
    pub fn spawn(self: Arc<Self>) -> (mpsc::Sender<AnalysisRequest>, JoinHandle<usize>) {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let handle = tokio::spawn(async move { self.run(receiver).await });
        (sender, handle)
    }

    pub async fn run(&self, mut requests: mpsc::Receiver<AnalysisRequest>) -> usize {
        let mut handled = 0;
        while let Some(request) = requests.recv().await {
            let outcome = self.process(request).await;
            handled += 1;
            // No subscribers is not an error.
            let _ = self.outcomes.send(outcome);
        }
        tracing::info!("Analysis pipeline stopped after {} requests", handled);
        handled
    }

    /// Handle one request and return its outcome without publishing it.
    pub async fn process(&self, request: AnalysisRequest) -> AnalysisOutcome {
        let input = request.input.to_string();
        tracing::debug!("Processing analysis request {} for {}", request.id, input);
        let mut coordinate = None;
        let status = match self.analyze(&request, &mut coordinate).await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!("Analysis of {} failed: {:#}", input, e);
                OutcomeStatus::Failed {
                    error: format!("{:#}", e),
                }
            }
        };
        AnalysisOutcome {
            id: request.id,
            input,
            coordinate,
            status,
        }
    }

    async fn analyze(
        &self,
        request: &AnalysisRequest,
        coordinate_out: &mut Option<Coordinate>,
    ) -> Result<OutcomeStatus> {
        let base = self.provider.fetch(&request.input).await?;
        let coordinate = base.coordinate().clone();
        *coordinate_out = Some(coordinate.clone());

        if self.sink.contains(&coordinate).await? {
            tracing::info!("Merged graph of {} is already stored", coordinate);
            return Ok(OutcomeStatus::AlreadyStored);
        }

        let (dependencies, resolution) = self.resolve(&coordinate, request.at).await?;
        let (partials, missing) = self.provider.fetch_all(&dependencies).await?;
        if !missing.is_empty() {
            tracing::warn!(
                "{} of {} dependencies of {} have no partial call graph",
                missing.len(),
                dependencies.len(),
                coordinate
            );
        }

        let merger = CallGraphMerger::new(self.merge_options);
        let outcome = tokio::task::spawn_blocking(move || merger.merge(&base, &partials))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))??;

        self.sink.store(&coordinate, outcome.graph).await?;
        Ok(OutcomeStatus::Stored {
            report: outcome.report,
            missing,
            resolution,
        })
    }

    /// Dependencies to merge with. A revision unknown to the dependency
    /// graph is merged alone.
    async fn resolve(
        &self,
        coordinate: &Coordinate,
        at: Option<i64>,
    ) -> Result<(Vec<Coordinate>, Vec<Degradation>)> {
        let graph = Arc::clone(&self.graph);
        let options = self.resolve_options.clone();
        let root = coordinate.clone();
        let resolved = tokio::task::spawn_blocking(move || {
            Resolver::with_options(&graph, options).resolve_dependencies(&root, at, true)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?;

        match resolved {
            Ok(resolution) => Ok((
                resolution.revisions.into_iter().map(|r| r.coordinate).collect(),
                resolution.degraded,
            )),
            Err(ResolveError::UnknownRevision(_)) => {
                tracing::warn!("{} is not in the dependency graph, merging it alone", coordinate);
                Ok((
                    Vec::new(),
                    vec![Degradation::new(
                        ErrorClass::MissingRevision,
                        coordinate.to_string(),
                        "revision unknown to the dependency graph, no dependencies merged",
                    )],
                ))
            }
            Err(e) => Err(e.into()),
        }
    }
}
