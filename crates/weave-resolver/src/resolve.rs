//! Transitive dependency and dependent resolution
//!
//! Dependencies are resolved breadth-first with nearest-wins mediation: the
//! first depth at which an artifact appears decides its version, and among
//! candidates at that depth the highest satisfying version wins.

use crate::error::ResolveError;
use crate::graph::DependencyGraph;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use weave_core::config::ResolverConfig;
use weave_core::{
    ArtifactKey, Coordinate, Degradation, DependencyConstraint, ErrorClass, Exclusion, Revision,
    Scope,
};

/// Query knobs shared by dependency and dependent resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Skip constraints on wholly unknown artifacts instead of failing.
    pub ignore_missing: bool,
    pub include_scopes: Vec<Scope>,
    /// Follow optional constraints of the queried revision itself.
    pub include_optional: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ResolveOptions {
            ignore_missing: false,
            include_scopes: Scope::DEFAULT_RESOLUTION.to_vec(),
            include_optional: true,
        }
    }
}

impl From<&ResolverConfig> for ResolveOptions {
    fn from(config: &ResolverConfig) -> Self {
        ResolveOptions {
            ignore_missing: config.ignore_missing,
            include_scopes: config.scopes.clone(),
            include_optional: config.include_optional,
        }
    }
}

/// Result of one query.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Resolution {
    /// Selected revisions, sorted by coordinate.
    pub revisions: Vec<Revision>,
    /// Distance from the queried revision at which each artifact was found.
    pub depth: BTreeMap<String, usize>,
    /// Branches that yielded nothing.
    pub degraded: Vec<Degradation>,
}

impl Resolution {
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.revisions.iter().any(|r| &r.coordinate == coordinate)
    }

    pub fn coordinates(&self) -> Vec<&Coordinate> {
        self.revisions.iter().map(|r| &r.coordinate).collect()
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }
}

/// Candidate chosen for one artifact at the current depth.
struct Selection<'g> {
    revision: &'g Revision,
    /// Exclusions inherited by the selected revision's own constraints.
    exclusions: Vec<Exclusion>,
}

pub struct Resolver<'g> {
    graph: &'g DependencyGraph,
    options: ResolveOptions,
}

impl<'g> Resolver<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self::with_options(graph, ResolveOptions::default())
    }

    pub fn with_options(graph: &'g DependencyGraph, options: ResolveOptions) -> Self {
        Resolver { graph, options }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn graph(&self) -> &'g DependencyGraph {
        self.graph
    }

    fn root(&self, coordinate: &Coordinate) -> Result<&'g Revision, ResolveError> {
        self.graph
            .revision(coordinate)
            .ok_or_else(|| ResolveError::UnknownRevision(coordinate.clone()))
    }

    fn follows(&self, constraint: &DependencyConstraint, depth: usize) -> bool {
        if !self.options.include_scopes.contains(&constraint.scope) {
            return false;
        }
        !constraint.optional || (depth == 1 && self.options.include_optional)
    }

    /// Revisions `coordinate` depends on, as of `at` (release timestamps
    /// `<= at`) when given. A timestamp of zero or below means no limit.
    pub fn resolve_dependencies(
        &self,
        coordinate: &Coordinate,
        at: Option<i64>,
        transitive: bool,
    ) -> Result<Resolution, ResolveError> {
        let at = effective_timestamp(at);
        let root = self.root(coordinate)?;
        let mut resolution = Resolution::default();
        let mut visited: HashSet<&ArtifactKey> = HashSet::from([root.artifact()]);
        let mut frontier: Vec<(&Revision, Vec<Exclusion>)> = vec![(root, Vec::new())];
        let mut depth = 1;

        while !frontier.is_empty() {
            let mut level: BTreeMap<&ArtifactKey, Selection<'g>> = BTreeMap::new();

            for (node, inherited) in &frontier {
                for constraint in self.graph.constraints_of(&node.coordinate) {
                    if !self.follows(constraint, depth) {
                        continue;
                    }
                    if inherited.iter().any(|e| e.matches(&constraint.target)) {
                        tracing::trace!("{} excluded below {}", constraint.target, node.coordinate);
                        continue;
                    }
                    if visited.contains(&constraint.target) {
                        if &constraint.target == root.artifact() {
                            tracing::debug!("Dependency cycle back to {}", root.coordinate);
                        }
                        continue;
                    }

                    let known = self.graph.revisions_of(&constraint.target);
                    if known.is_empty() {
                        if self.options.ignore_missing {
                            tracing::debug!("Ignoring missing artifact {}", constraint.target);
                            continue;
                        }
                        return Err(ResolveError::MissingRevision {
                            source_revision: node.coordinate.clone(),
                            target: constraint.target.clone(),
                        });
                    }

                    // `known` is sorted highest first.
                    let best = known.into_iter().find(|r| {
                        constraint.is_satisfied_by(&r.coordinate.parsed_version())
                            && at.is_none_or(|t| r.release_timestamp <= t)
                    });
                    let Some(best) = best else {
                        tracing::warn!("Unresolvable constraint {}", constraint);
                        resolution.degraded.push(Degradation::new(
                            ErrorClass::UnresolvableConstraint,
                            constraint.to_string(),
                            match at {
                                Some(t) => format!("no satisfying revision released by {}", t),
                                None => "no satisfying revision".to_string(),
                            },
                        ));
                        continue;
                    };

                    let replace = match level.get(&constraint.target) {
                        None => true,
                        Some(current) => best.coordinate > current.revision.coordinate,
                    };
                    if replace {
                        let mut exclusions = inherited.clone();
                        exclusions.extend(constraint.exclusions.iter().cloned());
                        level.insert(
                            &constraint.target,
                            Selection {
                                revision: best,
                                exclusions,
                            },
                        );
                    }
                }
            }

            let mut next = Vec::with_capacity(level.len());
            for (artifact, selection) in level {
                visited.insert(artifact);
                resolution.depth.insert(artifact.to_string(), depth);
                resolution.revisions.push(selection.revision.clone());
                next.push((selection.revision, selection.exclusions));
            }

            if !transitive {
                break;
            }
            frontier = next;
            depth += 1;
        }

        resolution.revisions.sort();
        tracing::debug!(
            "Resolved {} dependencies of {} ({} degraded)",
            resolution.revisions.len(),
            coordinate,
            resolution.degraded.len()
        );
        Ok(resolution)
    }

    /// Revisions that depend on `coordinate`.
    ///
    /// A dependent must be released no earlier than the revision it depends
    /// on, and no later than `at` when given. Structural candidates are
    /// confirmed by resolving their own dependencies, so a revision is only
    /// returned if its mediated dependency set actually contains
    /// `coordinate` as of the same `at`.
    pub fn resolve_dependents(
        &self,
        coordinate: &Coordinate,
        at: Option<i64>,
        transitive: bool,
    ) -> Result<Resolution, ResolveError> {
        let at = effective_timestamp(at);
        let root = self.root(coordinate)?;
        let mut visited: HashSet<&Coordinate> = HashSet::from([&root.coordinate]);
        let mut candidates: Vec<(&'g Revision, usize)> = Vec::new();
        let mut frontier: Vec<&'g Revision> = vec![root];
        let mut depth = 1;

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for node in &frontier {
                let version = node.coordinate.parsed_version();
                for (dependent, constraint) in self.graph.dependents_of(node.artifact()) {
                    if !self.options.include_scopes.contains(&constraint.scope)
                        || !constraint.is_satisfied_by(&version)
                        || dependent.release_timestamp < node.release_timestamp
                        || at.is_some_and(|t| dependent.release_timestamp > t)
                    {
                        continue;
                    }
                    if visited.insert(&dependent.coordinate) {
                        candidates.push((dependent, depth));
                        next.push(dependent);
                    }
                }
            }
            if !transitive {
                break;
            }
            frontier = next;
            depth += 1;
        }

        let confirmed: Vec<(&Revision, usize)> = candidates
            .par_iter()
            .filter(|(candidate, _)| {
                match self.resolve_dependencies(&candidate.coordinate, at, transitive) {
                    Ok(forward) => forward.contains(&root.coordinate),
                    Err(e) => {
                        tracing::debug!("Discarding dependent {}: {}", candidate.coordinate, e);
                        false
                    }
                }
            })
            .copied()
            .collect();

        let mut resolution = Resolution::default();
        for (revision, depth) in confirmed {
            resolution
                .depth
                .entry(revision.artifact().to_string())
                .or_insert(depth);
            resolution.revisions.push(revision.clone());
        }
        resolution.revisions.sort();
        tracing::debug!(
            "Resolved {} dependents of {} from {} candidates",
            resolution.revisions.len(),
            coordinate,
            candidates.len()
        );
        Ok(resolution)
    }
}

/// Timestamps of zero or below leave the query unbounded.
pub fn effective_timestamp(at: Option<i64>) -> Option<i64> {
    at.filter(|t| *t > 0)
}
