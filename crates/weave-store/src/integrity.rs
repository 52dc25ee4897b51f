//! Store integrity check
//!
//! Decodes every entry of a filesystem store and compares it against its
//! metadata. Problems are collected, not raised, so one bad entry does not
//! hide the state of the others.

use crate::fs::FsGraphStore;
use crate::store::GraphStore;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use weave_core::MergedCallGraph;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub checked: usize,
    pub healthy: usize,
    pub problems: Vec<IntegrityProblem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityProblem {
    pub path: PathBuf,
    pub detail: String,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.problems.is_empty()
    }

    fn problem(&mut self, path: PathBuf, detail: impl Into<String>) {
        let detail = detail.into();
        tracing::warn!("{}: {}", path.display(), detail);
        self.problems.push(IntegrityProblem { path, detail });
    }
}

pub fn check_store(store: &FsGraphStore) -> anyhow::Result<IntegrityReport> {
    let mut report = IntegrityReport::default();
    let mut described: HashSet<PathBuf> = HashSet::new();

    for meta in store.list()? {
        let path = store.graph_path(&meta.coordinate);
        described.insert(path.clone());
        report.checked += 1;

        let graph = match store.get(&meta.coordinate) {
            Ok(graph) => graph,
            Err(e) => {
                report.problem(path, e.to_string());
                continue;
            }
        };
        let before = report.problems.len();
        if graph.node_count() != meta.node_count || graph.edge_count() != meta.edge_count {
            report.problem(
                path.clone(),
                format!(
                    "metadata records {} nodes and {} edges, graph has {} and {}",
                    meta.node_count,
                    meta.edge_count,
                    graph.node_count(),
                    graph.edge_count()
                ),
            );
        }
        for uri in duplicate_internal_uris(&graph) {
            report.problem(path.clone(), format!("internal URI {} appears more than once", uri));
        }
        if report.problems.len() == before {
            report.healthy += 1;
        }
    }

    for path in store.graph_files()? {
        if described.contains(&path) {
            continue;
        }
        report.checked += 1;
        match store.read_graph(&path) {
            Ok(_) => report.problem(path, "graph without metadata"),
            Err(e) => report.problem(path, format!("graph without metadata: {}", e)),
        }
    }

    tracing::info!(
        "Checked {} stored graphs: {} healthy, {} problems",
        report.checked,
        report.healthy,
        report.problems.len()
    );
    Ok(report)
}

fn duplicate_internal_uris(graph: &MergedCallGraph) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = graph
        .nodes()
        .filter(|(_, node)| node.internal && !seen.insert(node.uri.as_str()))
        .map(|(_, node)| node.uri.clone())
        .collect();
    duplicates.sort();
    duplicates.dedup();
    duplicates
}
