//! Consistency checks over merged graphs

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use weave_core::MergedCallGraph;

/// Result of scanning a merged graph for repeated node URIs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UriCheck {
    pub total: usize,
    /// URIs carried by more than one node, with their occurrence count.
    pub duplicates: BTreeMap<String, usize>,
}

impl UriCheck {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty()
    }
}

pub fn check_uris(graph: &MergedCallGraph) -> UriCheck {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for (_, node) in graph.nodes() {
        *counts.entry(node.uri.clone()).or_default() += 1;
    }
    let total = counts.values().sum();
    counts.retain(|_, count| *count > 1);
    if !counts.is_empty() {
        tracing::warn!("{} URIs appear on more than one node", counts.len());
    }
    UriCheck {
        total,
        duplicates: counts,
    }
}

/// Edges between internal nodes of `reference` that `merged` lacks,
/// compared by URI.
///
/// `reference` is typically the graph of a single artifact and `merged` a
/// graph stitched from it and its dependencies; every call the artifact
/// resolved on its own must survive stitching.
pub fn missing_calls(reference: &MergedCallGraph, merged: &MergedCallGraph) -> Vec<(String, String)> {
    let present: HashSet<(&str, &str)> = merged
        .edges()
        .into_iter()
        .filter_map(|(source, target)| {
            Some((merged.node(source)?.uri.as_str(), merged.node(target)?.uri.as_str()))
        })
        .collect();

    reference
        .edges()
        .into_iter()
        .filter_map(|(source, target)| Some((reference.node(source)?, reference.node(target)?)))
        .filter(|(source, target)| source.internal && target.internal)
        .filter(|(source, target)| !present.contains(&(source.uri.as_str(), target.uri.as_str())))
        .map(|(source, target)| (source.uri.clone(), target.uri.clone()))
        .collect()
}
