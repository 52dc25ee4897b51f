//! Node and edge records of merged call graphs

use crate::partial::CallKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Global identifier of a callable within one merged graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Gid(pub u64);

impl Gid {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Gid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A callable in a merged graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallableNode {
    /// Global URI for internal nodes; the symbolic reference for
    /// placeholders.
    pub uri: String,
    /// Type URI (`/namespace/Type`) when known, empty otherwise.
    pub owning_type: String,
    /// True when some contributing artifact defines the method's body.
    pub internal: bool,
}

impl CallableNode {
    pub fn internal(uri: impl Into<String>, owning_type: impl Into<String>) -> Self {
        CallableNode {
            uri: uri.into(),
            owning_type: owning_type.into(),
            internal: true,
        }
    }

    pub fn external(uri: impl Into<String>, owning_type: impl Into<String>) -> Self {
        CallableNode {
            uri: uri.into(),
            owning_type: owning_type.into(),
            internal: false,
        }
    }
}

/// Side-table entry for one GID pair: every call kind that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallMetadata {
    pub kinds: BTreeSet<CallKind>,
}

// ── Export document ─────────────────────────────────────────

/// Serialized node entry of a merged graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub gid: Gid,
    pub uri: String,
    #[serde(default)]
    pub owning_type: String,
    pub internal: bool,
}

/// Serialized edge entry; `kinds` is the edge's side-table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: Gid,
    pub target: Gid,
    #[serde(default)]
    pub kinds: Vec<CallKind>,
}

/// On-the-wire shape of a merged graph: node table and edge table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedGraphDocument {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}
