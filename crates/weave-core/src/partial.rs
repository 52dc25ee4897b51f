//! Partial call graph document
//!
//! The shape handed over by the external analysis front-end for one
//! artifact: its class hierarchy, the methods it defines, the methods it
//! references but does not define, and its call sites. URIs inside the
//! document are local to the owning artifact.

use crate::coordinate::{Coordinate, Revision};
use crate::error::ParseError;
use crate::hierarchy::ClassHierarchy;
use crate::uri::MethodUri;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// How a call site dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    Static,
    Special,
    Virtual,
    Interface,
    Dynamic,
}

impl CallKind {
    /// Calls resolved by walking the class hierarchy.
    pub fn is_dispatched(self) -> bool {
        matches!(self, CallKind::Virtual | CallKind::Interface)
    }
}

impl FromStr for CallKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "static" => Ok(CallKind::Static),
            "special" => Ok(CallKind::Special),
            "virtual" => Ok(CallKind::Virtual),
            "interface" => Ok(CallKind::Interface),
            "dynamic" => Ok(CallKind::Dynamic),
            other => Err(ParseError::UnknownCallKind(other.to_string())),
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallKind::Static => "static",
            CallKind::Special => "special",
            CallKind::Virtual => "virtual",
            CallKind::Interface => "interface",
            CallKind::Dynamic => "dynamic",
        };
        f.write_str(name)
    }
}

/// One call site of a partial call graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEdge {
    /// Local URI of the calling method; must be an internal node.
    pub caller: String,
    /// Local URI of the callee. For virtual and interface calls its type is
    /// the static receiver type; for dynamic calls it is the best-known
    /// symbolic reference and need not parse.
    pub callee_ref: String,
    pub kind: CallKind,
}

impl CallEdge {
    pub fn new(caller: impl Into<String>, callee_ref: impl Into<String>, kind: CallKind) -> Self {
        CallEdge {
            caller: caller.into(),
            callee_ref: callee_ref.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialCallGraph {
    pub revision: Revision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_hierarchy: Option<ClassHierarchy>,
    /// Local URIs of the methods defined by this artifact.
    #[serde(default)]
    pub internal_nodes: Vec<String>,
    /// Local URIs referenced but not defined here.
    #[serde(default)]
    pub external_node_references: Vec<String>,
    /// Concrete types instantiated in this artifact, when the front-end
    /// computed them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instantiated_types: Option<Vec<String>>,
    #[serde(default)]
    pub call_edges: Vec<CallEdge>,
}

impl PartialCallGraph {
    pub fn new(revision: Revision) -> Self {
        PartialCallGraph {
            revision,
            class_hierarchy: Some(ClassHierarchy::new()),
            internal_nodes: Vec::new(),
            external_node_references: Vec::new(),
            instantiated_types: None,
            call_edges: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn coordinate(&self) -> &Coordinate {
        &self.revision.coordinate
    }

    /// Whether any call site needs the class hierarchy to resolve.
    pub fn has_dispatched_calls(&self) -> bool {
        self.call_edges.iter().any(|e| e.kind.is_dispatched())
    }

    /// Structural problems of the document, in a stable order.
    ///
    /// An empty list means the graph can be merged without degrading.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.class_hierarchy.is_none() && self.has_dispatched_calls() {
            problems.push("virtual or interface calls without a class hierarchy".to_string());
        }

        let internal: HashSet<&str> = self.internal_nodes.iter().map(String::as_str).collect();
        for uri in &self.internal_nodes {
            if MethodUri::parse(uri).is_err() {
                problems.push(format!("malformed internal node URI {}", uri));
            }
        }
        for edge in &self.call_edges {
            if !internal.contains(edge.caller.as_str()) {
                problems.push(format!("caller {} is not an internal node", edge.caller));
            }
            if edge.kind != CallKind::Dynamic && MethodUri::parse(&edge.callee_ref).is_err() {
                problems.push(format!("malformed callee reference {}", edge.callee_ref));
            }
        }
        problems
    }
}
