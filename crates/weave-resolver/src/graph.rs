//! Dependency graph wrapper using petgraph::DiGraph
//!
//! Revisions and artifacts are both nodes. A constraint is an edge from the
//! declaring revision to the target artifact; every revision hangs off its
//! artifact by a has-version edge. Constraints are therefore resolved at
//! query time against whatever versions the artifact node has.

use crate::error::SourceError;
use crate::source::MetadataSource;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use weave_core::{ArtifactKey, Coordinate, DependencyConstraint, Revision};

#[derive(Debug, Clone)]
enum DepNode {
    Revision(Revision),
    Artifact,
}

#[derive(Debug, Clone, Copy)]
enum DepEdge {
    /// Index into the constraint table.
    Constraint(usize),
    HasVersion,
}

/// Read-only after construction; share it by reference or `Arc` across
/// queries.
pub struct DependencyGraph {
    inner: DiGraph<DepNode, DepEdge>,
    revisions: HashMap<Coordinate, NodeIndex>,
    artifacts: HashMap<ArtifactKey, NodeIndex>,
    constraints: Vec<DependencyConstraint>,
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("revisions", &self.revisions.len())
            .field("artifacts", &self.artifacts.len())
            .field("constraints", &self.constraints.len())
            .finish()
    }
}

impl DependencyGraph {
    /// Ingest everything a metadata source knows.
    pub fn build(source: &dyn MetadataSource) -> Result<Self, SourceError> {
        let started = std::time::Instant::now();
        let mut revisions = Vec::new();
        for artifact in source.list_artifacts()? {
            revisions.extend(source.list_revisions(&artifact)?);
        }
        let mut constraints = Vec::new();
        for revision in &revisions {
            constraints.extend(source.list_dependency_constraints(&revision.coordinate)?);
        }

        let graph = Self::from_parts(revisions, constraints);
        tracing::info!(
            "Built dependency graph: {} revisions, {} constraints ({} dangling) in {:?}",
            graph.revision_count(),
            graph.constraint_count(),
            graph.dangling_constraints().len(),
            started.elapsed()
        );
        Ok(graph)
    }

    /// Assemble a graph from revision and constraint lists.
    ///
    /// Duplicate revisions keep the first occurrence. Constraints declared by
    /// unknown revisions are dropped.
    pub fn from_parts(revisions: Vec<Revision>, constraints: Vec<DependencyConstraint>) -> Self {
        let mut graph = DependencyGraph {
            inner: DiGraph::new(),
            revisions: HashMap::new(),
            artifacts: HashMap::new(),
            constraints: Vec::new(),
        };

        for revision in revisions {
            if graph.revisions.contains_key(&revision.coordinate) {
                tracing::debug!("Duplicate revision {}", revision.coordinate);
                continue;
            }
            let artifact = graph.artifact_node(revision.artifact());
            let coordinate = revision.coordinate.clone();
            let idx = graph.inner.add_node(DepNode::Revision(revision));
            graph.inner.add_edge(artifact, idx, DepEdge::HasVersion);
            graph.revisions.insert(coordinate, idx);
        }

        for constraint in constraints {
            let Some(&source) = graph.revisions.get(&constraint.source) else {
                tracing::warn!("Dropping constraint of unknown revision: {}", constraint);
                continue;
            };
            let target = graph.artifact_node(&constraint.target);
            let id = graph.constraints.len();
            graph.inner.add_edge(source, target, DepEdge::Constraint(id));
            graph.constraints.push(constraint);
        }

        graph
    }

    fn artifact_node(&mut self, artifact: &ArtifactKey) -> NodeIndex {
        if let Some(&idx) = self.artifacts.get(artifact) {
            return idx;
        }
        let idx = self.inner.add_node(DepNode::Artifact);
        self.artifacts.insert(artifact.clone(), idx);
        idx
    }

    fn revision_at(&self, idx: NodeIndex) -> Option<&Revision> {
        match &self.inner[idx] {
            DepNode::Revision(r) => Some(r),
            DepNode::Artifact => None,
        }
    }

    pub fn revision(&self, coordinate: &Coordinate) -> Option<&Revision> {
        self.revisions
            .get(coordinate)
            .and_then(|&idx| self.revision_at(idx))
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.revisions.contains_key(coordinate)
    }

    /// Known revisions of an artifact, highest version first.
    pub fn revisions_of(&self, artifact: &ArtifactKey) -> Vec<&Revision> {
        let Some(&idx) = self.artifacts.get(artifact) else {
            return Vec::new();
        };
        let mut versions: Vec<&Revision> = self
            .inner
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|e| self.revision_at(e.target()))
            .collect();
        versions.sort_by(|a, b| b.cmp(a));
        versions
    }

    /// Constraints declared by a revision, in declaration order.
    pub fn constraints_of(&self, coordinate: &Coordinate) -> Vec<&DependencyConstraint> {
        let Some(&idx) = self.revisions.get(coordinate) else {
            return Vec::new();
        };
        let mut ids: Vec<usize> = self
            .inner
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|e| match e.weight() {
                DepEdge::Constraint(id) => Some(*id),
                DepEdge::HasVersion => None,
            })
            .collect();
        ids.sort_unstable();
        ids.into_iter().map(|id| &self.constraints[id]).collect()
    }

    /// Revisions declaring a constraint on `artifact`, with that constraint,
    /// in declaration order.
    pub fn dependents_of(&self, artifact: &ArtifactKey) -> Vec<(&Revision, &DependencyConstraint)> {
        let Some(&idx) = self.artifacts.get(artifact) else {
            return Vec::new();
        };
        let mut edges: Vec<(usize, NodeIndex)> = self
            .inner
            .edges_directed(idx, Direction::Incoming)
            .filter_map(|e| match e.weight() {
                DepEdge::Constraint(id) => Some((*id, e.source())),
                DepEdge::HasVersion => None,
            })
            .collect();
        edges.sort_unstable_by_key(|(id, _)| *id);
        edges
            .into_iter()
            .filter_map(|(id, source)| {
                self.revision_at(source)
                    .map(|revision| (revision, &self.constraints[id]))
            })
            .collect()
    }

    /// Constraints whose target artifact has no known revision.
    pub fn dangling_constraints(&self) -> Vec<&DependencyConstraint> {
        self.constraints
            .iter()
            .filter(|c| self.revisions_of(&c.target).is_empty())
            .collect()
    }

    /// All revisions, sorted by coordinate.
    pub fn revisions(&self) -> Vec<&Revision> {
        let mut all: Vec<&Revision> = self
            .revisions
            .values()
            .filter_map(|&idx| self.revision_at(idx))
            .collect();
        all.sort();
        all
    }

    pub fn constraints(&self) -> &[DependencyConstraint] {
        &self.constraints
    }

    pub fn revision_count(&self) -> usize {
        self.revisions.len()
    }

    pub fn artifact_count(&self) -> usize {
        self.artifacts.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}
