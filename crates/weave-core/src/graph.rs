//! Merged call graph wrapper using petgraph::DiGraph with GIDs as indices

use crate::model::*;
use crate::partial::CallKind;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("unknown node {0}")]
    UnknownNode(Gid),
    #[error("external node {0} cannot be the source of an edge")]
    ExternalSource(Gid),
    #[error("node table is not dense: expected gid {expected}, found {found}")]
    SparseGids { expected: Gid, found: Gid },
}

/// The merged call graph: a directed graph whose node indices are the GIDs.
///
/// Nodes are never removed, so GIDs stay dense. Placeholder (external)
/// nodes never get outgoing edges. Per-edge call kinds live in a side table
/// keyed by GID pair rather than on the graph itself.
#[derive(Clone, Serialize, Deserialize)]
#[serde(into = "MergedGraphDocument", try_from = "MergedGraphDocument")]
pub struct MergedCallGraph {
    inner: DiGraph<CallableNode, ()>,
    call_metadata: BTreeMap<(Gid, Gid), CallMetadata>,
}

impl std::fmt::Debug for MergedCallGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergedCallGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl MergedCallGraph {
    pub fn new() -> Self {
        MergedCallGraph {
            inner: DiGraph::new(),
            call_metadata: BTreeMap::new(),
        }
    }

    /// Add a node. Returns the next dense GID.
    pub fn add_node(&mut self, node: CallableNode) -> Gid {
        let idx = self.inner.add_node(node);
        Gid(idx.index() as u64)
    }

    /// Add a call edge, recording its kind in the side table.
    ///
    /// Re-adding an existing pair only extends its recorded kinds.
    pub fn add_edge(&mut self, source: Gid, target: Gid, kind: CallKind) -> Result<(), GraphError> {
        self.insert_edge(source, target)?.kinds.insert(kind);
        Ok(())
    }

    fn insert_edge(&mut self, source: Gid, target: Gid) -> Result<&mut CallMetadata, GraphError> {
        let source_node = self.node(source).ok_or(GraphError::UnknownNode(source))?;
        if !source_node.internal {
            return Err(GraphError::ExternalSource(source));
        }
        if self.node(target).is_none() {
            return Err(GraphError::UnknownNode(target));
        }
        self.inner
            .update_edge(NodeIndex::new(source.index()), NodeIndex::new(target.index()), ());
        Ok(self.call_metadata.entry((source, target)).or_default())
    }

    pub fn node(&self, gid: Gid) -> Option<&CallableNode> {
        self.inner.node_weight(NodeIndex::new(gid.index()))
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn internal_count(&self) -> usize {
        self.nodes().filter(|(_, n)| n.internal).count()
    }

    /// Iterate over all nodes in GID order.
    pub fn nodes(&self) -> impl Iterator<Item = (Gid, &CallableNode)> {
        self.inner
            .node_indices()
            .map(move |idx| (Gid(idx.index() as u64), &self.inner[idx]))
    }

    /// Iterate over placeholder nodes.
    pub fn external_nodes(&self) -> impl Iterator<Item = (Gid, &CallableNode)> {
        self.nodes().filter(|(_, n)| !n.internal)
    }

    /// All edges as sorted GID pairs.
    pub fn edges(&self) -> Vec<(Gid, Gid)> {
        self.call_metadata.keys().copied().collect()
    }

    /// Callees of a node, in ascending GID order.
    pub fn successors(&self, gid: Gid) -> Vec<Gid> {
        self.neighbors(gid, Direction::Outgoing)
    }

    /// Callers of a node, in ascending GID order.
    pub fn predecessors(&self, gid: Gid) -> Vec<Gid> {
        self.neighbors(gid, Direction::Incoming)
    }

    fn neighbors(&self, gid: Gid, direction: Direction) -> Vec<Gid> {
        if self.node(gid).is_none() {
            return Vec::new();
        }
        let mut out: Vec<Gid> = self
            .inner
            .edges_directed(NodeIndex::new(gid.index()), direction)
            .map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                Gid(other.index() as u64)
            })
            .collect();
        out.sort();
        out.dedup();
        out
    }

    pub fn has_edge(&self, source: Gid, target: Gid) -> bool {
        self.call_metadata.contains_key(&(source, target))
    }

    pub fn call_metadata(&self, source: Gid, target: Gid) -> Option<&CallMetadata> {
        self.call_metadata.get(&(source, target))
    }

    /// Find a node by URI (first match).
    pub fn find_by_uri(&self, uri: &str) -> Option<Gid> {
        self.nodes().find(|(_, n)| n.uri == uri).map(|(gid, _)| gid)
    }

    /// GID → URI map, as used by graph stores.
    pub fn gid_to_uri(&self) -> HashMap<Gid, String> {
        self.nodes().map(|(gid, n)| (gid, n.uri.clone())).collect()
    }

    pub fn to_document(&self) -> MergedGraphDocument {
        MergedGraphDocument {
            nodes: self
                .nodes()
                .map(|(gid, n)| NodeRecord {
                    gid,
                    uri: n.uri.clone(),
                    owning_type: n.owning_type.clone(),
                    internal: n.internal,
                })
                .collect(),
            edges: self
                .call_metadata
                .iter()
                .map(|(&(source, target), meta)| EdgeRecord {
                    source,
                    target,
                    kinds: meta.kinds.iter().copied().collect(),
                })
                .collect(),
        }
    }

    /// Rebuild a graph from its document, checking density and the
    /// no-outgoing-edges rule for placeholders.
    pub fn from_document(doc: MergedGraphDocument) -> Result<Self, GraphError> {
        let mut graph = MergedCallGraph::new();
        let mut nodes = doc.nodes;
        nodes.sort_by_key(|n| n.gid);
        for record in nodes {
            let expected = Gid(graph.node_count() as u64);
            if record.gid != expected {
                return Err(GraphError::SparseGids {
                    expected,
                    found: record.gid,
                });
            }
            graph.add_node(CallableNode {
                uri: record.uri,
                owning_type: record.owning_type,
                internal: record.internal,
            });
        }
        for edge in doc.edges {
            graph
                .insert_edge(edge.source, edge.target)?
                .kinds
                .extend(edge.kinds);
        }
        Ok(graph)
    }
}

impl Default for MergedCallGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for MergedCallGraph {
    fn eq(&self, other: &Self) -> bool {
        self.to_document() == other.to_document()
    }
}

impl From<MergedCallGraph> for MergedGraphDocument {
    fn from(graph: MergedCallGraph) -> Self {
        graph.to_document()
    }
}

impl TryFrom<MergedGraphDocument> for MergedCallGraph {
    type Error = GraphError;

    fn try_from(doc: MergedGraphDocument) -> Result<Self, Self::Error> {
        MergedCallGraph::from_document(doc)
    }
}
