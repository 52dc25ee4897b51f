//! Test utilities for weave-resolver

use crate::graph::DependencyGraph;
use crate::source::InMemoryMetadataSource;
use weave_core::{ArtifactKey, Coordinate, DependencyConstraint, Revision, VersionRange};

pub const GROUP: &str = "org.example";

pub fn coord(artifact: &str, version: &str) -> Coordinate {
    Coordinate::maven(GROUP, artifact, version)
}

/// Builder for small dependency universes in the `org.example` group.
#[derive(Default)]
pub struct Universe {
    source: InMemoryMetadataSource,
}

impl Universe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(mut self, artifact: &str, version: &str, timestamp: i64) -> Self {
        self.source
            .add_revision(Revision::new(coord(artifact, version), timestamp));
        self
    }

    pub fn depends(self, from: (&str, &str), to: &str, range: &str) -> Self {
        self.constraint(constraint(from, to, range))
    }

    pub fn constraint(mut self, constraint: DependencyConstraint) -> Self {
        self.source.add_constraint(constraint);
        self
    }

    pub fn build(self) -> DependencyGraph {
        DependencyGraph::build(&self.source).unwrap()
    }
}

pub fn constraint(from: (&str, &str), to: &str, range: &str) -> DependencyConstraint {
    DependencyConstraint::new(
        coord(from.0, from.1),
        ArtifactKey::new(GROUP, to),
        VersionRange::parse(range).unwrap(),
    )
}

/// Every dependent is released after the revisions it can depend on.
///
/// ```text
/// web 1.0 @80 -> app [1.0]
/// app 1.0 @30 -> lib [1.0,2.0), util 1.0
/// app 2.0 @70 -> lib [2.0,)
/// tool 1.0 @40 -> lib [1.0]
/// lib 1.0 @10, lib 1.1 @20, lib 2.0 @60, util 1.0 @5
/// ```
pub fn release_ordered_universe() -> DependencyGraph {
    Universe::new()
        .revision("lib", "1.0", 10)
        .revision("lib", "1.1", 20)
        .revision("lib", "2.0", 60)
        .revision("util", "1.0", 5)
        .revision("app", "1.0", 30)
        .revision("app", "2.0", 70)
        .revision("tool", "1.0", 40)
        .revision("web", "1.0", 80)
        .depends(("app", "1.0"), "lib", "[1.0,2.0)")
        .depends(("app", "1.0"), "util", "1.0")
        .depends(("app", "2.0"), "lib", "[2.0,)")
        .depends(("tool", "1.0"), "lib", "[1.0]")
        .depends(("web", "1.0"), "app", "[1.0]")
        .build()
}

pub fn versions(resolution: &crate::Resolution) -> Vec<String> {
    resolution
        .revisions
        .iter()
        .map(|r| format!("{}:{}", r.coordinate.artifact_id(), r.coordinate.version))
        .collect()
}
