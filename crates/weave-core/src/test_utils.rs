//! Test utilities for Weave Core

use crate::coordinate::{Coordinate, Revision};
use crate::hierarchy::{ClassHierarchy, TypeDecl};
use crate::partial::{CallEdge, CallKind, PartialCallGraph};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Revision of `org.example:<artifact>:<version>`.
pub fn revision(artifact: &str, version: &str, timestamp: i64) -> Revision {
    Revision::new(Coordinate::maven("org.example", artifact, version), timestamp)
}

/// A small application: `Main.main` calls a static helper, an interface
/// method on `Shape`, and a dynamic bootstrap.
pub fn sample_partial_graph() -> PartialCallGraph {
    let hierarchy = ClassHierarchy::new()
        .with_type(
            "/app/Main",
            TypeDecl::new().with_method("main()V").with_method("helper()V"),
        )
        .with_type("/app/Shape", TypeDecl::new().with_abstract_method("area()D"))
        .with_type(
            "/app/Square",
            TypeDecl::new().with_method("area()D").implements("/app/Shape"),
        );

    let mut graph = PartialCallGraph::new(revision("app", "1.0", 100));
    graph.class_hierarchy = Some(hierarchy);
    graph.internal_nodes = vec![
        "/app/Main.main()V".to_string(),
        "/app/Main.helper()V".to_string(),
        "/app/Square.area()D".to_string(),
    ];
    graph.external_node_references = vec!["/java.lang/Object.<init>()V".to_string()];
    graph.call_edges = vec![
        CallEdge::new("/app/Main.main()V", "/app/Main.helper()V", CallKind::Static),
        CallEdge::new("/app/Main.main()V", "/app/Shape.area()D", CallKind::Interface),
        CallEdge::new("/app/Main.main()V", "lambda$main$0", CallKind::Dynamic),
    ];
    graph
}

/// Write a `weave.toml` with the given contents into a fresh directory.
pub fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(crate::config::CONFIG_FILE);
    fs::write(&path, contents).unwrap();
    (dir, path)
}
