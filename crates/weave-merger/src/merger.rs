//! Merge orchestration
//!
//! Step 1 builds the universe and assigns GIDs. Step 2 resolves call sites
//! in parallel against the frozen universe. Step 3 assembles the merged
//! graph sequentially, creating placeholders in call-site order so the
//! result is the same on every run.

use crate::dispatch::{CallResolution, Dispatcher};
use crate::error::MergeError;
use crate::report::MergeReport;
use crate::strategy::{ClassHierarchyFilter, Strategy, TargetFilter, create_filter};
use crate::universe::Universe;
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;
use weave_core::config::MergerConfig;
use weave_core::{CallEdge, CallKind, CallableNode, ErrorClass, Gid, MergedCallGraph, MethodUri, PartialCallGraph};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    pub strategy: Strategy,
    /// Also resolve the call sites of the dependencies, not only the base.
    pub deep: bool,
}

impl TryFrom<&MergerConfig> for MergeOptions {
    type Error = MergeError;

    fn try_from(config: &MergerConfig) -> Result<Self, Self::Error> {
        Ok(MergeOptions {
            strategy: config.strategy.parse()?,
            deep: config.deep,
        })
    }
}

/// A merged graph and the diagnostics of producing it.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub graph: MergedCallGraph,
    pub report: MergeReport,
}

pub struct CallGraphMerger {
    options: MergeOptions,
    filter: Box<dyn TargetFilter>,
}

impl CallGraphMerger {
    pub fn new(options: MergeOptions) -> Self {
        CallGraphMerger {
            options,
            filter: create_filter(options.strategy),
        }
    }

    pub fn options(&self) -> MergeOptions {
        self.options
    }

    pub fn merge(
        &self,
        base: &PartialCallGraph,
        dependencies: &[PartialCallGraph],
    ) -> Result<MergeOutcome, MergeError> {
        let started = Instant::now();
        let mut report = MergeReport::new(base.coordinate().to_string(), self.options.strategy.to_string());

        // Step 1
        let universe = Universe::build(base, dependencies);
        report.degraded.extend(universe.skipped().iter().cloned());
        report.contributors = universe
            .contributors()
            .iter()
            .map(|c| c.coordinate().to_string())
            .collect();

        let blocks = if self.options.deep {
            universe.contributors().len()
        } else {
            1
        };
        let cha = ClassHierarchyFilter;
        let mut work: Vec<(usize, &CallEdge)> = Vec::new();
        let mut filters: Vec<&dyn TargetFilter> = Vec::with_capacity(blocks);
        for block in 0..blocks {
            let contributor = universe.contributor(block);
            let coordinate = contributor.coordinate().to_string();

            if !contributor.has_hierarchy() && contributor.graph.has_dispatched_calls() {
                tracing::warn!(
                    "{} has no class hierarchy; its virtual and interface calls stay unresolved",
                    coordinate
                );
                report.degrade(
                    ErrorClass::MergeInputMalformed,
                    coordinate.clone(),
                    "missing class hierarchy, virtual and interface calls left unresolved",
                );
            }

            if self.filter.needs_instantiation_data() && !contributor.has_instantiation_data() {
                tracing::info!("{} has no instantiated types, resolving its calls with CHA", coordinate);
                report.rta_fallbacks.push(coordinate);
                filters.push(&cha);
            } else {
                filters.push(self.filter.as_ref());
            }

            work.extend(contributor.graph.call_edges.iter().map(|edge| (block, edge)));
        }

        // Step 2
        let dispatcher = Dispatcher::new(&universe);
        let resolutions: Vec<CallResolution> = work
            .par_iter()
            .map(|&(block, edge)| {
                let use_hierarchy = universe.contributor(block).has_hierarchy();
                dispatcher.resolve(block, edge, use_hierarchy, filters[block])
            })
            .collect();

        // Step 3
        let mut graph = MergedCallGraph::new();
        for node in universe.nodes() {
            graph.add_node(node.clone());
        }
        let mut placeholders: HashMap<&str, Gid> = HashMap::new();

        for (&(block, edge), resolution) in work.iter().zip(resolutions) {
            match resolution {
                CallResolution::Dropped => {
                    let coordinate = universe.contributor(block).coordinate();
                    tracing::debug!("Dropping call from unknown caller {} in {}", edge.caller, coordinate);
                    report.degrade(
                        ErrorClass::MergeInputMalformed,
                        coordinate.to_string(),
                        format!("caller {} is not an internal node", edge.caller),
                    );
                    report.dropped_calls += 1;
                }
                CallResolution::Resolved { caller, targets } => {
                    for target in targets {
                        graph.add_edge(caller, target, edge.kind)?;
                    }
                    report.resolved_calls += 1;
                }
                CallResolution::Unresolved { caller } => {
                    let reference = edge.callee_ref.as_str();
                    // Node URIs stay unique: an internal node is never shadowed
                    // by a placeholder of the same name.
                    let indexed = universe.symbols().lookup(reference);
                    let placeholder = match indexed.or_else(|| placeholders.get(reference).copied()) {
                        Some(gid) => gid,
                        None => {
                            let owning_type = MethodUri::parse(reference)
                                .map(|uri| uri.type_uri())
                                .unwrap_or_default();
                            let gid = graph.add_node(CallableNode::external(reference, owning_type));
                            placeholders.insert(reference, gid);
                            gid
                        }
                    };
                    graph.add_edge(caller, placeholder, edge.kind)?;
                    if edge.kind == CallKind::Dynamic {
                        report.dynamic_calls += 1;
                    } else {
                        report.unresolved_calls += 1;
                    }
                }
            }
        }

        report.internal_nodes = universe.nodes().len();
        report.placeholder_nodes = placeholders.len();
        report.edges = graph.edge_count();
        report.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!("Merged {}", report);

        Ok(MergeOutcome { graph, report })
    }
}

/// Merge `base` with `dependencies` using `strategy`, resolving the base's
/// call sites only.
pub fn merge(
    base: &PartialCallGraph,
    dependencies: &[PartialCallGraph],
    strategy: Strategy,
) -> Result<MergeOutcome, MergeError> {
    CallGraphMerger::new(MergeOptions {
        strategy,
        deep: false,
    })
    .merge(base, dependencies)
}
