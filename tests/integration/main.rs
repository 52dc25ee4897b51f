//! Integration tests for Weave
//!
//! These tests drive the resolver, repository, merger and stores together
//! the way the CLI does.

use std::sync::Arc;
use tempfile::TempDir;
use weave_core::{
    ArtifactKey, CallEdge, CallKind, ClassHierarchy, Coordinate, PartialCallGraph, Revision, Scope,
    TypeDecl,
};
use weave_merger::{CallGraphMerger, JcgDocument, MergeOptions, Strategy, check_uris, missing_calls, to_jcg};
use weave_pipeline::{AnalysisPipeline, AnalysisRequest, RepositoryProvider, StoreSink};
use weave_resolver::{
    DependencyGraph, JsonMetadataSource, Resolver, RevisionGraph, SeedSelection, load_snapshot,
    save_snapshot,
};
use weave_store::{
    AnalysisInput, FsGraphStore, GraphStore, PartialGraphRepository, check_store,
};

const METADATA: &str = r#"[
  {"groupId": "org.example", "artifactId": "x", "version": "1.0", "releaseTimestamp": 120,
   "dependencies": [{"product": "org.example:y", "constraints": ["[1.0,)"]}]},
  {"groupId": "org.example", "artifactId": "y", "version": "1.0", "releaseTimestamp": 50},
  {"groupId": "org.example", "artifactId": "y", "version": "2.0", "releaseTimestamp": 150},
  {"groupId": "org.example", "artifactId": "app", "version": "1.0", "releaseTimestamp": 200,
   "dependencies": [
     {"product": "org.example:shapes", "constraints": ["[1.0]"]},
     {"product": "org.example:junit", "constraints": ["4.13"], "scope": "test"}
   ]},
  {"groupId": "org.example", "artifactId": "shapes", "version": "1.0", "releaseTimestamp": 100},
  {"groupId": "org.example", "artifactId": "junit", "version": "4.13", "releaseTimestamp": 10}
]"#;

fn coordinate(artifact: &str, version: &str) -> Coordinate {
    Coordinate::maven("org.example", artifact, version)
}

fn dependency_graph() -> DependencyGraph {
    let source = JsonMetadataSource::from_json(METADATA).unwrap();
    DependencyGraph::build(&source).unwrap()
}

/// `app` calls `Shape.area()` through the interface declared by `shapes`.
fn app_partial() -> PartialCallGraph {
    let mut graph = PartialCallGraph::new(Revision::new(coordinate("app", "1.0"), 200));
    graph.class_hierarchy = Some(ClassHierarchy::new().with_type(
        "/app/Main",
        TypeDecl::new().with_method("main()V").with_method("log()V"),
    ));
    graph.internal_nodes = vec!["/app/Main.main()V".to_string(), "/app/Main.log()V".to_string()];
    graph.call_edges = vec![
        CallEdge::new("/app/Main.main()V", "/shapes/Shape.area()D", CallKind::Interface),
        CallEdge::new("/app/Main.main()V", "/app/Main.log()V", CallKind::Static),
        CallEdge::new("/app/Main.log()V", "/java.io/PrintStream.println()V", CallKind::Virtual),
    ];
    graph
}

fn shapes_partial() -> PartialCallGraph {
    let mut graph = PartialCallGraph::new(Revision::new(coordinate("shapes", "1.0"), 100));
    graph.class_hierarchy = Some(
        ClassHierarchy::new()
            .with_type("/shapes/Shape", TypeDecl::new().with_abstract_method("area()D"))
            .with_type(
                "/shapes/Circle",
                TypeDecl::new().with_method("area()D").implements("/shapes/Shape"),
            )
            .with_type(
                "/shapes/Square",
                TypeDecl::new().with_method("area()D").implements("/shapes/Shape"),
            ),
    );
    graph.internal_nodes = vec![
        "/shapes/Circle.area()D".to_string(),
        "/shapes/Square.area()D".to_string(),
    ];
    graph
}

fn repository(dir: &TempDir) -> PartialGraphRepository {
    let repository = PartialGraphRepository::new(dir.path().join("callgraphs"));
    repository.save(&app_partial()).unwrap();
    repository.save(&shapes_partial()).unwrap();
    repository
}

#[test]
fn test_timestamp_filtered_resolution() {
    let graph = dependency_graph();
    let resolver = Resolver::new(&graph);

    let at_100 = resolver
        .resolve_dependencies(&coordinate("x", "1.0"), Some(100), true)
        .unwrap();
    assert!(at_100.contains(&coordinate("y", "1.0")));
    assert!(!at_100.contains(&coordinate("y", "2.0")));

    let unlimited = resolver
        .resolve_dependencies(&coordinate("x", "1.0"), None, true)
        .unwrap();
    assert!(unlimited.contains(&coordinate("y", "2.0")));
}

#[test]
fn test_test_scope_is_not_followed() {
    let graph = dependency_graph();
    let resolution = Resolver::new(&graph)
        .resolve_dependencies(&coordinate("app", "1.0"), None, true)
        .unwrap();
    let found: Vec<String> = resolution
        .revisions
        .iter()
        .map(|r| r.coordinate.to_string())
        .collect();
    assert_eq!(found, vec!["org.example:shapes:1.0"]);
}

#[test]
fn test_snapshot_answers_like_the_built_graph() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.bin");
    let built = dependency_graph();
    save_snapshot(&built, &path).unwrap();
    let restored = load_snapshot(&path).unwrap();

    for (artifact, version) in [("x", "1.0"), ("y", "1.0"), ("app", "1.0")] {
        let c = coordinate(artifact, version);
        let before = Resolver::new(&built).resolve_dependents(&c, None, true).unwrap();
        let after = Resolver::new(&restored).resolve_dependents(&c, None, true).unwrap();
        assert_eq!(before.revisions, after.revisions, "dependents of {}", c);
    }
}

#[test]
fn test_seed_stats_skip_test_scope() {
    let graph = dependency_graph();
    let revisions = RevisionGraph::build(&graph, &Scope::DEFAULT_RESOLUTION);
    assert_eq!(revisions.edge_count(), 3);

    let stats = revisions.seed_stats(
        &SeedSelection::Products(vec![ArtifactKey::new("org.example", "y")]),
        1,
    );
    assert_eq!(stats.len(), 1);
    assert_eq!((stats[0].seed_revisions, stats[0].ball, stats[0].closure), (2, 3, 3));

    let junit = graph.revision(&coordinate("junit", "4.13")).unwrap();
    assert_eq!(revisions.backward_ball(&[junit], 3).len(), 1);
}

#[test]
fn test_resolve_merge_store_round_trip() {
    let dir = TempDir::new().unwrap();
    let repository = repository(&dir);
    let graph = dependency_graph();

    let base = repository
        .load_input(&AnalysisInput::Coordinate(coordinate("app", "1.0")))
        .unwrap();
    let resolution = Resolver::new(&graph)
        .resolve_dependencies(base.coordinate(), None, true)
        .unwrap();
    let coordinates: Vec<Coordinate> = resolution.revisions.into_iter().map(|r| r.coordinate).collect();
    let (dependencies, missing) = repository.load_available(&coordinates).unwrap();
    assert!(missing.is_empty());

    let outcome = CallGraphMerger::new(MergeOptions::default())
        .merge(&base, &dependencies)
        .unwrap();
    let merged = &outcome.graph;
    assert_eq!(merged.internal_count(), 4);
    assert_eq!(merged.external_nodes().count(), 1);
    assert_eq!(outcome.report.resolved_calls, 2);
    assert_eq!(outcome.report.unresolved_calls, 1);
    assert!(check_uris(merged).is_clean());

    // Calls the base resolved on its own survive stitching.
    let alone = CallGraphMerger::new(MergeOptions::default())
        .merge(&base, &[])
        .unwrap();
    assert!(missing_calls(&alone.graph, merged).is_empty());

    let store = FsGraphStore::open(dir.path().join("graphs")).unwrap();
    store.put(base.coordinate(), merged).unwrap();
    assert_eq!(&store.get(base.coordinate()).unwrap(), merged);
    assert!(check_store(&store).unwrap().is_healthy());

    let jcg = JcgDocument::concat([to_jcg(merged)]);
    let main = &jcg.reachable_methods[0];
    assert_eq!(main.method.declaring_class, "Lapp/Main;");
    let targets: Vec<&str> = main
        .call_sites
        .iter()
        .map(|site| site.targets[0].declaring_class.as_str())
        .collect();
    assert_eq!(targets, vec!["Lapp/Main;", "Lshapes/Circle;", "Lshapes/Square;"]);
}

#[test]
fn test_strategies_agree_without_instantiation_data() {
    let base = app_partial();
    let deps = vec![shapes_partial()];
    let cha = weave_merger::merge(&base, &deps, Strategy::Cha).unwrap();
    let rta = weave_merger::merge(&base, &deps, Strategy::RtaLike).unwrap();
    assert_eq!(cha.graph, rta.graph);
    assert_eq!(rta.report.rta_fallbacks, vec!["org.example:app:1.0"]);
}

#[test]
fn test_pipeline_fills_the_store() {
    let dir = TempDir::new().unwrap();
    let repository = repository(&dir);
    let store: Arc<dyn GraphStore> = Arc::new(FsGraphStore::open(dir.path().join("graphs")).unwrap());
    let pipeline = AnalysisPipeline::new(
        Arc::new(dependency_graph()),
        Arc::new(RepositoryProvider::new(Arc::new(repository))),
        Arc::new(StoreSink::new(Arc::clone(&store))),
    );

    let outcome = tokio_test::block_on(pipeline.process(AnalysisRequest::new(
        1,
        AnalysisInput::Coordinate(coordinate("app", "1.0")),
    )));
    assert!(outcome.is_stored(), "{:?}", outcome);
    assert_eq!(store.get(&coordinate("app", "1.0")).unwrap().internal_count(), 4);
}
