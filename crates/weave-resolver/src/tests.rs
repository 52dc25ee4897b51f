//! Unit tests for weave-resolver module

use crate::test_utils::*;
use crate::*;
use weave_core::{Coordinate, DependencyConstraint, ErrorClass, Exclusion, Revision, Scope};

// ── Graph construction ──────────────────────────────────────

#[test]
fn test_build_indexes_revisions_and_constraints() {
    let graph = release_ordered_universe();
    assert_eq!(graph.revision_count(), 8);
    assert_eq!(graph.artifact_count(), 5);
    assert_eq!(graph.constraint_count(), 5);
    assert!(graph.dangling_constraints().is_empty());

    let libs: Vec<&str> = graph
        .revisions_of(&coord("lib", "1.0").artifact)
        .iter()
        .map(|r| r.version())
        .collect();
    assert_eq!(libs, vec!["2.0", "1.1", "1.0"]);

    let app = graph.constraints_of(&coord("app", "1.0"));
    assert_eq!(app.len(), 2);
    assert_eq!(app[0].target.artifact_id, "lib");
    assert_eq!(app[1].target.artifact_id, "util");

    let lib_users: Vec<String> = graph
        .dependents_of(&coord("lib", "1.0").artifact)
        .iter()
        .map(|(r, _)| r.coordinate.to_string())
        .collect();
    assert_eq!(
        lib_users,
        vec!["org.example:app:1.0", "org.example:app:2.0", "org.example:tool:1.0"]
    );
}

#[test]
fn test_dangling_constraints_are_recorded() {
    let graph = Universe::new()
        .revision("a", "1.0", 1)
        .depends(("a", "1.0"), "ghost", "[1.0,)")
        .depends(("missing-source", "1.0"), "a", "1.0")
        .build();
    assert_eq!(graph.constraint_count(), 1);
    let dangling = graph.dangling_constraints();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].target.artifact_id, "ghost");
}

// ── Dependencies ────────────────────────────────────────────

#[test]
fn test_timestamp_filtered_resolution() {
    let graph = Universe::new()
        .revision("x", "1.0", 100)
        .revision("y", "1.0", 50)
        .revision("y", "2.0", 150)
        .depends(("x", "1.0"), "y", "[1.0,)")
        .build();
    let resolver = Resolver::new(&graph);

    let at_100 = resolver
        .resolve_dependencies(&coord("x", "1.0"), Some(100), true)
        .unwrap();
    assert_eq!(versions(&at_100), vec!["y:1.0"]);
    assert!(!at_100.contains(&coord("y", "2.0")));

    let latest = resolver
        .resolve_dependencies(&coord("x", "1.0"), None, true)
        .unwrap();
    assert_eq!(versions(&latest), vec!["y:2.0"]);
}

#[test]
fn test_dependencies_respect_timestamp() {
    let graph = release_ordered_universe();
    let resolver = Resolver::new(&graph);
    for t in [5, 25, 35, 65, 100] {
        for revision in graph.revisions() {
            let resolution = resolver
                .resolve_dependencies(&revision.coordinate, Some(t), true)
                .unwrap();
            for dep in &resolution.revisions {
                assert!(
                    dep.release_timestamp <= t,
                    "{} resolved {} released after {}",
                    revision,
                    dep,
                    t
                );
            }
        }
    }
}

#[test]
fn test_cycle_terminates() {
    let graph = Universe::new()
        .revision("a", "1.0", 1)
        .revision("b", "1.0", 1)
        .depends(("a", "1.0"), "b", "[1.0,)")
        .depends(("b", "1.0"), "a", "[1.0,)")
        .build();
    let resolution = Resolver::new(&graph)
        .resolve_dependencies(&coord("a", "1.0"), None, true)
        .unwrap();
    assert_eq!(versions(&resolution), vec!["b:1.0"]);
    assert!(resolution.degraded.is_empty());
}

#[test]
fn test_nearest_declaration_wins() {
    let graph = Universe::new()
        .revision("a", "1.0", 1)
        .revision("b", "1.0", 1)
        .revision("c", "1.0", 1)
        .revision("c", "2.0", 1)
        .depends(("a", "1.0"), "b", "1.0")
        .depends(("a", "1.0"), "c", "2.0")
        .depends(("b", "1.0"), "c", "1.0")
        .build();
    let resolution = Resolver::new(&graph)
        .resolve_dependencies(&coord("a", "1.0"), None, true)
        .unwrap();
    assert_eq!(versions(&resolution), vec!["b:1.0", "c:2.0"]);
    assert_eq!(resolution.depth["org.example:c"], 1);
}

#[test]
fn test_equal_depth_takes_highest_version() {
    let graph = Universe::new()
        .revision("a", "1.0", 1)
        .revision("b", "1.0", 1)
        .revision("d", "1.0", 1)
        .revision("c", "1.0", 1)
        .revision("c", "2.0", 1)
        .revision("c", "3.0", 1)
        .depends(("a", "1.0"), "b", "1.0")
        .depends(("a", "1.0"), "d", "1.0")
        .depends(("b", "1.0"), "c", "[1.0,2.0]")
        .depends(("d", "1.0"), "c", "[1.0,3.0]")
        .build();
    let resolution = Resolver::new(&graph)
        .resolve_dependencies(&coord("a", "1.0"), None, true)
        .unwrap();
    assert_eq!(versions(&resolution), vec!["b:1.0", "c:3.0", "d:1.0"]);
    assert_eq!(resolution.depth["org.example:c"], 2);
}

#[test]
fn test_non_transitive_returns_direct_only() {
    let graph = release_ordered_universe();
    let resolution = Resolver::new(&graph)
        .resolve_dependencies(&coord("web", "1.0"), None, false)
        .unwrap();
    assert_eq!(versions(&resolution), vec!["app:1.0"]);
}

#[test]
fn test_exclusions_accumulate_along_path() {
    let graph = Universe::new()
        .revision("a", "1.0", 1)
        .revision("e", "1.0", 1)
        .revision("b", "1.0", 1)
        .revision("d", "1.0", 1)
        .revision("c", "1.0", 1)
        .constraint(
            constraint(("a", "1.0"), "b", "1.0").with_exclusion(Exclusion::new(GROUP, "c")),
        )
        .depends(("e", "1.0"), "b", "1.0")
        .depends(("b", "1.0"), "d", "1.0")
        .depends(("d", "1.0"), "c", "1.0")
        .build();
    let resolver = Resolver::new(&graph);

    let excluded = resolver
        .resolve_dependencies(&coord("a", "1.0"), None, true)
        .unwrap();
    assert_eq!(versions(&excluded), vec!["b:1.0", "d:1.0"]);

    let plain = resolver
        .resolve_dependencies(&coord("e", "1.0"), None, true)
        .unwrap();
    assert_eq!(versions(&plain), vec!["b:1.0", "c:1.0", "d:1.0"]);
}

#[test]
fn test_optional_dependencies_only_at_first_level() {
    let graph = Universe::new()
        .revision("a", "1.0", 1)
        .revision("b", "1.0", 1)
        .revision("c", "1.0", 1)
        .constraint(constraint(("a", "1.0"), "b", "1.0").optional())
        .constraint(constraint(("b", "1.0"), "c", "1.0").optional())
        .build();

    let resolution = Resolver::new(&graph)
        .resolve_dependencies(&coord("a", "1.0"), None, true)
        .unwrap();
    assert_eq!(versions(&resolution), vec!["b:1.0"]);

    let options = ResolveOptions {
        include_optional: false,
        ..ResolveOptions::default()
    };
    let resolution = Resolver::with_options(&graph, options)
        .resolve_dependencies(&coord("a", "1.0"), None, true)
        .unwrap();
    assert!(resolution.is_empty());
}

#[test]
fn test_scope_filter() {
    let graph = Universe::new()
        .revision("a", "1.0", 1)
        .revision("junit", "4.12", 1)
        .revision("servlet", "3.0", 1)
        .constraint(constraint(("a", "1.0"), "junit", "4.12").with_scope(Scope::Test))
        .constraint(constraint(("a", "1.0"), "servlet", "3.0").with_scope(Scope::Provided))
        .constraint(constraint(("a", "1.0"), "not-published", "1.0").with_scope(Scope::Test))
        .build();

    let default = Resolver::new(&graph)
        .resolve_dependencies(&coord("a", "1.0"), None, true)
        .unwrap();
    assert!(default.is_empty());

    let options = ResolveOptions {
        include_scopes: vec![Scope::Compile, Scope::Provided],
        ..ResolveOptions::default()
    };
    let with_provided = Resolver::with_options(&graph, options)
        .resolve_dependencies(&coord("a", "1.0"), None, true)
        .unwrap();
    assert_eq!(versions(&with_provided), vec!["servlet:3.0"]);
}

#[test]
fn test_missing_revision_is_fatal_unless_ignored() {
    let graph = Universe::new()
        .revision("a", "1.0", 1)
        .revision("b", "1.0", 1)
        .depends(("a", "1.0"), "ghost", "[1.0,)")
        .depends(("a", "1.0"), "b", "1.0")
        .build();

    let err = Resolver::new(&graph)
        .resolve_dependencies(&coord("a", "1.0"), None, true)
        .unwrap_err();
    assert!(matches!(err, ResolveError::MissingRevision { .. }));
    assert_eq!(err.class(), ErrorClass::MissingRevision);

    let options = ResolveOptions {
        ignore_missing: true,
        ..ResolveOptions::default()
    };
    let resolution = Resolver::with_options(&graph, options)
        .resolve_dependencies(&coord("a", "1.0"), None, true)
        .unwrap();
    assert_eq!(versions(&resolution), vec!["b:1.0"]);
    assert!(resolution.degraded.is_empty());
}

#[test]
fn test_unknown_root() {
    let graph = release_ordered_universe();
    let err = Resolver::new(&graph)
        .resolve_dependencies(&coord("nope", "1.0"), None, true)
        .unwrap_err();
    assert!(matches!(err, ResolveError::UnknownRevision(_)));
}

#[test]
fn test_unresolvable_constraint_degrades_branch() {
    let graph = Universe::new()
        .revision("a", "1.0", 1)
        .revision("b", "1.0", 1)
        .revision("c", "1.0", 1)
        .depends(("a", "1.0"), "b", "[5.0,)")
        .depends(("a", "1.0"), "c", "1.0")
        .build();
    let resolution = Resolver::new(&graph)
        .resolve_dependencies(&coord("a", "1.0"), None, true)
        .unwrap();
    assert_eq!(versions(&resolution), vec!["c:1.0"]);
    assert_eq!(resolution.degraded.len(), 1);
    assert_eq!(
        resolution.degraded[0].class,
        ErrorClass::UnresolvableConstraint
    );
}

// ── Dependents ──────────────────────────────────────────────

#[test]
fn test_dependents_released_after_dependency() {
    let graph = Universe::new()
        .revision("lib", "1.0", 100)
        .revision("early", "1.0", 50)
        .revision("late", "1.0", 150)
        .depends(("early", "1.0"), "lib", "[1.0,)")
        .depends(("late", "1.0"), "lib", "[1.0,)")
        .build();
    let resolution = Resolver::new(&graph)
        .resolve_dependents(&coord("lib", "1.0"), None, true)
        .unwrap();
    assert_eq!(versions(&resolution), vec!["late:1.0"]);
}

#[test]
fn test_dependents_never_predate_queried_revision() {
    let graph = release_ordered_universe();
    let resolver = Resolver::new(&graph);
    for revision in graph.revisions() {
        for at in [None, Some(50), Some(100)] {
            let resolution = resolver
                .resolve_dependents(&revision.coordinate, at, true)
                .unwrap();
            for dependent in &resolution.revisions {
                assert!(dependent.release_timestamp >= revision.release_timestamp);
            }
        }
    }
}

#[test]
fn test_direct_and_transitive_dependents() {
    let graph = release_ordered_universe();
    let resolver = Resolver::new(&graph);

    let direct = resolver
        .resolve_dependents(&coord("lib", "1.1"), Some(100), false)
        .unwrap();
    assert_eq!(versions(&direct), vec!["app:1.0"]);

    let transitive = resolver
        .resolve_dependents(&coord("lib", "1.1"), Some(100), true)
        .unwrap();
    assert_eq!(versions(&transitive), vec!["app:1.0", "web:1.0"]);

    // app 1.0 mediates lib to 1.1, so only tool really uses lib 1.0.
    let pinned = resolver
        .resolve_dependents(&coord("lib", "1.0"), Some(100), true)
        .unwrap();
    assert_eq!(versions(&pinned), vec!["tool:1.0"]);
}

/// `b` accepts any `x`, but unbounded mediation picks `x 2.0`, which no
/// longer depends on `a`.
fn superseded_dependency_universe() -> DependencyGraph {
    Universe::new()
        .revision("a", "1.0", 10)
        .revision("x", "1.0", 20)
        .revision("x", "2.0", 200)
        .revision("b", "1.0", 100)
        .depends(("x", "1.0"), "a", "[1.0,)")
        .depends(("b", "1.0"), "x", "[1.0,)")
        .build()
}

#[test]
fn test_unbounded_dependents_are_confirmed_unbounded() {
    let graph = superseded_dependency_universe();
    let resolver = Resolver::new(&graph);

    let dependents = resolver
        .resolve_dependents(&coord("a", "1.0"), None, true)
        .unwrap();
    assert_eq!(versions(&dependents), vec!["x:1.0"]);

    let of_b = resolver
        .resolve_dependencies(&coord("b", "1.0"), None, true)
        .unwrap();
    assert_eq!(versions(&of_b), vec!["x:2.0"]);

    // As of b's release, x 1.0 is the newest and b reaches a through it.
    let at_release = resolver
        .resolve_dependents(&coord("a", "1.0"), Some(100), true)
        .unwrap();
    assert_eq!(versions(&at_release), vec!["b:1.0", "x:1.0"]);
}

#[test]
fn test_non_positive_timestamp_means_unbounded() {
    let graph = release_ordered_universe();
    let resolver = Resolver::new(&graph);
    let unbounded = resolver
        .resolve_dependencies(&coord("web", "1.0"), None, true)
        .unwrap();
    for at in [Some(0), Some(-5)] {
        let resolution = resolver
            .resolve_dependencies(&coord("web", "1.0"), at, true)
            .unwrap();
        assert_eq!(resolution.revisions, unbounded.revisions, "at={:?}", at);

        let dependents = resolver
            .resolve_dependents(&coord("lib", "1.1"), at, true)
            .unwrap();
        assert_eq!(versions(&dependents), vec!["app:1.0", "web:1.0"]);
    }
    assert_eq!(effective_timestamp(Some(0)), None);
    assert_eq!(effective_timestamp(Some(42)), Some(42));
}

#[test]
fn test_unbounded_inverse_consistency() {
    for graph in [release_ordered_universe(), superseded_dependency_universe()] {
        let resolver = Resolver::new(&graph);
        let all: Vec<&Revision> = graph.revisions();
        for transitive in [false, true] {
            for x in &all {
                let dependents = resolver
                    .resolve_dependents(&x.coordinate, None, transitive)
                    .unwrap();
                for dependent in &dependents.revisions {
                    let dependencies = resolver
                        .resolve_dependencies(&dependent.coordinate, None, transitive)
                        .unwrap();
                    assert!(
                        dependencies.contains(&x.coordinate),
                        "{} listed as dependent of {} but does not depend on it",
                        dependent.coordinate,
                        x.coordinate
                    );
                }
            }
        }
    }
}

#[test]
fn test_inverse_consistency() {
    let graph = release_ordered_universe();
    let resolver = Resolver::new(&graph);
    let all: Vec<&Revision> = graph.revisions();

    for transitive in [false, true] {
        for t in [35, 50, 100] {
            for x in &all {
                let dependents = resolver
                    .resolve_dependents(&x.coordinate, Some(t), transitive)
                    .unwrap();
                for r in all.iter().filter(|r| r.release_timestamp <= t) {
                    if r.coordinate == x.coordinate {
                        continue;
                    }
                    let dependencies = resolver
                        .resolve_dependencies(&r.coordinate, Some(t), transitive)
                        .unwrap();
                    assert_eq!(
                        dependents.contains(&r.coordinate),
                        dependencies.contains(&x.coordinate),
                        "x={} r={} t={} transitive={}",
                        x.coordinate,
                        r.coordinate,
                        t,
                        transitive
                    );
                }
            }
        }
    }
}

// ── Seed statistics ─────────────────────────────────────────

fn revision<'g>(graph: &'g DependencyGraph, artifact: &str, version: &str) -> &'g Revision {
    graph.revision(&coord(artifact, version)).unwrap()
}

fn artifact(name: &str) -> weave_core::ArtifactKey {
    weave_core::ArtifactKey::new(GROUP, name)
}

#[test]
fn test_revision_graph_expands_ranges() {
    let graph = release_ordered_universe();
    let revisions = RevisionGraph::build(&graph, &Scope::DEFAULT_RESOLUTION);
    assert_eq!(revisions.node_count(), 8);
    // app 1.0 reaches lib 1.0, lib 1.1 and util; the other three are single.
    assert_eq!(revisions.edge_count(), 6);
}

#[test]
fn test_revision_graph_follows_only_given_scopes() {
    let mut test_only = constraint(("tool", "1.0"), "util", "1.0");
    test_only.scope = Scope::Test;
    let graph = Universe::new()
        .revision("tool", "1.0", 1)
        .revision("util", "1.0", 1)
        .constraint(test_only)
        .build();
    assert_eq!(RevisionGraph::build(&graph, &[Scope::Compile]).edge_count(), 0);
    assert_eq!(RevisionGraph::build(&graph, &[Scope::Test]).edge_count(), 1);
}

#[test]
fn test_backward_ball_is_bounded_by_radius() {
    let graph = release_ordered_universe();
    let revisions = RevisionGraph::build(&graph, &Scope::DEFAULT_RESOLUTION);
    let seed = revision(&graph, "lib", "1.0");

    let names = |ball: Vec<&Revision>| -> Vec<String> {
        ball.iter()
            .map(|r| format!("{}:{}", r.coordinate.artifact_id(), r.coordinate.version))
            .collect()
    };
    assert_eq!(names(revisions.backward_ball(&[seed], 0)), vec!["lib:1.0"]);
    assert_eq!(
        names(revisions.backward_ball(&[seed], 1)),
        vec!["app:1.0", "lib:1.0", "tool:1.0"]
    );
    assert_eq!(
        names(revisions.backward_ball(&[seed], 2)),
        vec!["app:1.0", "lib:1.0", "tool:1.0", "web:1.0"]
    );

    let ball = revisions.backward_ball(&[seed], 1);
    assert_eq!(revisions.forward_closure_size(&ball), 5);
    assert_eq!(revisions.forward_closure_size(&[]), 0);
}

#[test]
fn test_page_rank_favours_shared_dependencies() {
    let graph = release_ordered_universe();
    let revisions = RevisionGraph::build(&graph, &Scope::DEFAULT_RESOLUTION);
    let ranked = revisions.page_rank();

    assert_eq!(ranked.len(), 8);
    assert_eq!(ranked[0].0.coordinate, coord("lib", "1.0"));
    let total: f64 = ranked.iter().map(|(_, score)| score).sum();
    assert!((total - 1.0).abs() < 1e-9, "total {}", total);
    assert_eq!(revisions.top_products(1), vec![artifact("lib")]);
}

#[test]
fn test_seed_stats_rows() {
    let graph = release_ordered_universe();
    let revisions = RevisionGraph::build(&graph, &Scope::DEFAULT_RESOLUTION);
    let stats = revisions.seed_stats(
        &SeedSelection::Products(vec![artifact("lib"), artifact("util")]),
        2,
    );
    let rows: Vec<(usize, usize, usize, usize, usize)> = stats
        .iter()
        .map(|s| (s.radius, s.seeds, s.seed_revisions, s.ball, s.closure))
        .collect();
    assert_eq!(
        rows,
        vec![(1, 1, 3, 6, 7), (1, 2, 4, 7, 7), (2, 1, 3, 7, 8), (2, 2, 4, 8, 8)]
    );

    let top = revisions.seed_stats(&SeedSelection::TopRevisions(1), 1);
    assert_eq!(top.len(), 1);
    assert_eq!((top[0].seed_revisions, top[0].ball, top[0].closure), (1, 3, 5));

    assert!(
        RevisionGraph::build(&Universe::new().build(), &Scope::DEFAULT_RESOLUTION)
            .seed_stats(&SeedSelection::TopProducts(3), 2)
            .is_empty()
    );
}

// ── Sources, snapshots, batches ─────────────────────────────

const METADATA: &str = r#"[
  {"groupId": "g", "artifactId": "app", "version": "1.0", "releaseTimestamp": 10,
   "dependencies": [
     {"product": "g:lib", "constraints": ["[1.0,)"], "scope": "compile", "exclusions": ["g:unwanted"]},
     {"product": "g:bad", "constraints": ["[2.0,1.0]"]},
     {"product": "g:test-only", "constraints": ["1.0"], "scope": "test"}
   ]},
  {"forge": "mvn", "groupId": "g", "artifactId": "lib", "version": "1.2", "releaseTimestamp": 5}
]"#;

#[test]
fn test_json_metadata_source() {
    let source = JsonMetadataSource::from_json(METADATA).unwrap();
    assert_eq!(source.skipped(), 1);

    let graph = DependencyGraph::build(&source).unwrap();
    assert_eq!(graph.revision_count(), 2);
    assert_eq!(graph.constraint_count(), 2);
    assert_eq!(graph.dangling_constraints().len(), 1);

    let app = Coordinate::maven("g", "app", "1.0");
    let constraints = graph.constraints_of(&app);
    assert_eq!(constraints[0].exclusions, vec![Exclusion::new("g", "unwanted")]);

    let resolution = Resolver::new(&graph)
        .resolve_dependencies(&app, None, true)
        .unwrap();
    assert_eq!(resolution.coordinates(), vec![&Coordinate::maven("g", "lib", "1.2")]);
}

#[test]
fn test_json_metadata_source_rejects_malformed_document() {
    assert!(matches!(
        JsonMetadataSource::from_json("{\"not\": \"an array\"}"),
        Err(SourceError::Json(_))
    ));
}

#[test]
fn test_snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshots").join("graph.bin");
    let graph = release_ordered_universe();
    save_snapshot(&graph, &path).unwrap();

    let restored = load_snapshot(&path).unwrap();
    assert_eq!(restored.revision_count(), graph.revision_count());
    assert_eq!(restored.constraint_count(), graph.constraint_count());

    let before = Resolver::new(&graph)
        .resolve_dependencies(&coord("web", "1.0"), Some(100), true)
        .unwrap();
    let after = Resolver::new(&restored)
        .resolve_dependencies(&coord("web", "1.0"), Some(100), true)
        .unwrap();
    assert_eq!(before.revisions, after.revisions);
    assert_eq!(
        after.revisions.iter().map(|r| r.release_timestamp).collect::<Vec<_>>(),
        vec![30, 20, 5]
    );
}

#[test]
fn test_snapshot_format_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old.bin");
    let old = (99u32, Vec::<Revision>::new(), Vec::<DependencyConstraint>::new());
    std::fs::write(&path, bincode::serialize(&old).unwrap()).unwrap();

    assert!(matches!(
        load_snapshot(&path),
        Err(SnapshotError::Format { found: 99, .. })
    ));
}

#[test]
fn test_batch_resolution() {
    let graph = release_ordered_universe();
    let resolver = Resolver::new(&graph);
    let input = "org.example:web:1.0\n\n# comment\nnot-a-coordinate\norg.example:app:2.0\n";
    let mut output = Vec::new();

    let summary = resolve_batch(
        &resolver,
        input.as_bytes(),
        &mut output,
        BatchMode::Dependencies,
        None,
        true,
    )
    .unwrap();
    assert_eq!(summary, BatchSummary { resolved: 2, failed: 1 });

    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "org.example:web:1.0,org.example:app:1.0;org.example:lib:1.1;org.example:util:1.0",
            "not-a-coordinate,",
            "org.example:app:2.0,org.example:lib:2.0",
        ]
    );
}

#[test]
fn test_batch_dependents() {
    let graph = release_ordered_universe();
    let resolver = Resolver::new(&graph);
    let mut output = Vec::new();
    resolve_batch(
        &resolver,
        "org.example:util:1.0\n".as_bytes(),
        &mut output,
        BatchMode::Dependents,
        Some(100),
        true,
    )
    .unwrap();
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "org.example:util:1.0,org.example:app:1.0;org.example:web:1.0\n"
    );
}
