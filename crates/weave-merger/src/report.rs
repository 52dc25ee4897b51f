//! Merge diagnostics

use serde::Serialize;
use std::fmt;
use weave_core::{Degradation, ErrorClass};

/// What happened during one merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    /// Coordinate of the base artifact.
    pub base: String,
    pub strategy: String,
    /// Contributing coordinates in universe order, base first.
    pub contributors: Vec<String>,
    pub internal_nodes: usize,
    pub placeholder_nodes: usize,
    pub edges: usize,
    /// Call sites with at least one resolved target
    pub resolved_calls: usize,
    /// Non-dynamic call sites sent to a placeholder
    pub unresolved_calls: usize,
    pub dynamic_calls: usize,
    /// Call sites dropped because their caller is not an internal node
    pub dropped_calls: usize,
    /// Artifacts without instantiated-type data whose calls fell back to CHA.
    pub rta_fallbacks: Vec<String>,
    pub degraded: Vec<Degradation>,
    pub duration_ms: u64,
}

impl MergeReport {
    pub fn new(base: impl Into<String>, strategy: impl Into<String>) -> Self {
        MergeReport {
            base: base.into(),
            strategy: strategy.into(),
            ..Default::default()
        }
    }

    pub fn degrade(&mut self, class: ErrorClass, artifact: impl Into<String>, detail: impl Into<String>) {
        self.degraded.push(Degradation::new(class, artifact, detail));
    }

    /// Degradations reported against one artifact.
    pub fn degradations_for(&self, coordinate: &str) -> Vec<&Degradation> {
        self.degraded
            .iter()
            .filter(|d| d.subject == coordinate)
            .collect()
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    /// Share of static, special, virtual and interface call sites that
    /// reached at least one internal target (0.0-1.0).
    pub fn resolution_rate(&self) -> f64 {
        let total = self.resolved_calls + self.unresolved_calls;
        if total == 0 {
            return 1.0;
        }
        self.resolved_calls as f64 / total as f64
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} internal + {} placeholder nodes, {} edges; calls: {} resolved, {} unresolved, {} dynamic, {} dropped ({:.1}% resolved) in {}ms",
            self.base,
            self.strategy,
            self.internal_nodes,
            self.placeholder_nodes,
            self.edges,
            self.resolved_calls,
            self.unresolved_calls,
            self.dynamic_calls,
            self.dropped_calls,
            self.resolution_rate() * 100.0,
            self.duration_ms
        )
    }
}
