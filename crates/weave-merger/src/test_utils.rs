//! Test utilities for the merger

use weave_core::{
    CallEdge, CallKind, ClassHierarchy, Coordinate, MergedCallGraph, PartialCallGraph, Revision,
    TypeDecl, qualify_local,
};

pub const GROUP: &str = "org.example";

pub fn coordinate(artifact: &str, version: &str) -> Coordinate {
    Coordinate::maven(GROUP, artifact, version)
}

/// Builder for small partial call graphs.
pub struct PartialBuilder {
    graph: PartialCallGraph,
}

impl PartialBuilder {
    pub fn new(artifact: &str, version: &str) -> Self {
        PartialBuilder {
            graph: PartialCallGraph::new(Revision::new(coordinate(artifact, version), 0)),
        }
    }

    pub fn with_type(mut self, type_uri: &str, decl: TypeDecl) -> Self {
        self.graph
            .class_hierarchy
            .get_or_insert_with(ClassHierarchy::new)
            .insert(type_uri, decl);
        self
    }

    pub fn internal(mut self, uri: &str) -> Self {
        self.graph.internal_nodes.push(uri.to_string());
        self
    }

    pub fn call(mut self, caller: &str, callee: &str, kind: CallKind) -> Self {
        self.graph.call_edges.push(CallEdge::new(caller, callee, kind));
        self
    }

    pub fn instantiates(mut self, type_uri: &str) -> Self {
        self.graph
            .instantiated_types
            .get_or_insert_with(Vec::new)
            .push(type_uri.to_string());
        self
    }

    pub fn without_hierarchy(mut self) -> Self {
        self.graph.class_hierarchy = None;
        self
    }

    pub fn build(self) -> PartialCallGraph {
        self.graph
    }
}

/// Base `a:1.0` declares interface `/a/I` with abstract `f()V` and calls it
/// from `/a/A.caller()V`.
pub fn interface_base() -> PartialBuilder {
    PartialBuilder::new("a", "1.0")
        .with_type("/a/I", TypeDecl::new().with_abstract_method("f()V"))
        .with_type("/a/A", TypeDecl::new().with_method("caller()V"))
        .internal("/a/A.caller()V")
        .call("/a/A.caller()V", "/a/I.f()V", CallKind::Interface)
}

/// Dependency `d:1.0` with `/d/C implements /a/I` overriding `f()V`.
pub fn implementing_dependency() -> PartialBuilder {
    PartialBuilder::new("d", "1.0")
        .with_type("/d/C", TypeDecl::new().with_method("f()V").implements("/a/I"))
        .internal("/d/C.f()V")
}

/// Global URI of a method of `org.example:<artifact>:<version>`.
pub fn global(artifact: &str, version: &str, local: &str) -> String {
    qualify_local(&coordinate(artifact, version), local)
}

/// Edges of a merged graph as URI pairs.
pub fn uri_edges(graph: &MergedCallGraph) -> Vec<(String, String)> {
    let mut edges: Vec<(String, String)> = graph
        .edges()
        .into_iter()
        .map(|(s, t)| (graph.node(s).unwrap().uri.clone(), graph.node(t).unwrap().uri.clone()))
        .collect();
    edges.sort();
    edges
}
