//! Test utilities for Weave Store

use weave_core::{
    CallEdge, CallKind, CallableNode, ClassHierarchy, Coordinate, MergedCallGraph,
    PartialCallGraph, Revision, TypeDecl,
};

pub fn coordinate(artifact: &str, version: &str) -> Coordinate {
    Coordinate::maven("org.example", artifact, version)
}

/// Two internal methods calling each other plus one placeholder.
pub fn small_graph() -> MergedCallGraph {
    let mut graph = MergedCallGraph::new();
    let main = graph.add_node(CallableNode::internal(
        "fasten://mvn!org.example:app$1.0/app/Main.main()V",
        "/app/Main",
    ));
    let helper = graph.add_node(CallableNode::internal(
        "fasten://mvn!org.example:app$1.0/app/Main.helper()V",
        "/app/Main",
    ));
    let println = graph.add_node(CallableNode::external("/java.io/PrintStream.println()V", "/java.io/PrintStream"));
    graph.add_edge(main, helper, CallKind::Static).unwrap();
    graph.add_edge(helper, main, CallKind::Static).unwrap();
    graph.add_edge(helper, println, CallKind::Virtual).unwrap();
    graph
}

pub fn partial_graph(artifact: &str, version: &str) -> PartialCallGraph {
    let mut graph = PartialCallGraph::new(Revision::new(coordinate(artifact, version), 42));
    graph.class_hierarchy = Some(
        ClassHierarchy::new().with_type("/app/Main", TypeDecl::new().with_method("main()V")),
    );
    graph.internal_nodes = vec!["/app/Main.main()V".to_string()];
    graph.call_edges = vec![CallEdge::new(
        "/app/Main.main()V",
        "/java.lang/Object.toString()%2Fjava.lang%2FString",
        CallKind::Virtual,
    )];
    graph
}
