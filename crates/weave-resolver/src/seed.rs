//! Seed statistics over the revision-level dependency graph
//!
//! The revision graph has an edge from every revision to every known
//! revision satisfying one of its followed constraints, without mediation
//! or timestamps. A seed set is widened by a backward visit of bounded
//! radius (who could depend on the seeds), and the forward closure of that
//! ball is what an analysis seeded there would have to cover.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use weave_core::{ArtifactKey, Coordinate, Revision, Scope};

use crate::graph::DependencyGraph;

pub const PAGE_RANK_DAMPING: f64 = 0.85;
pub const PAGE_RANK_ITERATIONS: usize = 20;

/// How the seed revisions are chosen for each row of statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSelection {
    /// All revisions of the first `p` listed products.
    Products(Vec<ArtifactKey>),
    /// All revisions of the `n` products ranked highest by PageRank.
    TopProducts(usize),
    /// The `n` revisions ranked highest by PageRank.
    TopRevisions(usize),
}

/// One row: `seeds` seed products (or revisions) visited at `radius`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedStat {
    pub radius: usize,
    pub seeds: usize,
    pub seed_revisions: usize,
    pub ball: usize,
    pub closure: usize,
}

pub struct RevisionGraph<'g> {
    inner: DiGraph<&'g Revision, ()>,
    index: HashMap<&'g Coordinate, NodeIndex>,
}

impl<'g> RevisionGraph<'g> {
    /// Expand constraints in `scopes` into revision-to-revision edges.
    pub fn build(graph: &'g DependencyGraph, scopes: &[Scope]) -> Self {
        let mut inner = DiGraph::new();
        let mut index = HashMap::new();
        for revision in graph.revisions() {
            index.insert(&revision.coordinate, inner.add_node(revision));
        }

        for revision in graph.revisions() {
            let source = index[&revision.coordinate];
            for constraint in graph.constraints_of(&revision.coordinate) {
                if !scopes.contains(&constraint.scope) {
                    continue;
                }
                for target in graph.revisions_of(&constraint.target) {
                    if constraint.is_satisfied_by(&target.coordinate.parsed_version()) {
                        inner.update_edge(source, index[&target.coordinate], ());
                    }
                }
            }
        }

        tracing::debug!(
            "Revision graph: {} revisions, {} edges",
            inner.node_count(),
            inner.edge_count()
        );
        RevisionGraph { inner, index }
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Revisions of any of `products`, sorted by coordinate.
    pub fn revisions_of_products(&self, products: &[ArtifactKey]) -> Vec<&'g Revision> {
        let mut found: Vec<&'g Revision> = self
            .inner
            .node_weights()
            .copied()
            .filter(|r| products.contains(r.artifact()))
            .collect();
        found.sort();
        found
    }

    /// Every revision within `radius` reversed edges of a seed, seeds
    /// included.
    pub fn backward_ball(&self, seeds: &[&Revision], radius: usize) -> Vec<&'g Revision> {
        let mut distance: HashMap<NodeIndex, usize> = HashMap::new();
        let mut queue = VecDeque::new();
        for seed in seeds {
            if let Some(&idx) = self.index.get(&seed.coordinate) {
                if distance.insert(idx, 0).is_none() {
                    queue.push_back(idx);
                }
            }
        }

        while let Some(idx) = queue.pop_front() {
            let d = distance[&idx];
            if d == radius {
                continue;
            }
            for dependent in self.inner.neighbors_directed(idx, Direction::Incoming) {
                if !distance.contains_key(&dependent) {
                    distance.insert(dependent, d + 1);
                    queue.push_back(dependent);
                }
            }
        }

        let mut ball: Vec<&'g Revision> = distance.keys().map(|&idx| self.inner[idx]).collect();
        ball.sort();
        ball
    }

    /// Number of revisions reachable from `start`, `start` included.
    pub fn forward_closure_size(&self, start: &[&Revision]) -> usize {
        let mut dfs = Dfs::empty(&self.inner);
        let mut count = 0;
        for revision in start {
            let Some(&idx) = self.index.get(&revision.coordinate) else {
                continue;
            };
            // Already discovered nodes are skipped by `next`.
            dfs.move_to(idx);
            while dfs.next(&self.inner).is_some() {
                count += 1;
            }
        }
        count
    }

    /// PageRank by power iteration with uniform teleport; dangling mass is
    /// spread evenly. Highest score first, ties by coordinate.
    pub fn page_rank(&self) -> Vec<(&'g Revision, f64)> {
        let n = self.inner.node_count();
        if n == 0 {
            return Vec::new();
        }
        let uniform = 1.0 / n as f64;
        let mut ranks = vec![uniform; n];

        for _ in 0..PAGE_RANK_ITERATIONS {
            let dangling: f64 = self
                .inner
                .node_indices()
                .filter(|&idx| self.out_degree(idx) == 0)
                .map(|idx| ranks[idx.index()])
                .sum();
            let next: Vec<f64> = self
                .inner
                .node_indices()
                .map(|idx| {
                    let incoming: f64 = self
                        .inner
                        .neighbors_directed(idx, Direction::Incoming)
                        .map(|p| ranks[p.index()] / self.out_degree(p) as f64)
                        .sum();
                    (1.0 - PAGE_RANK_DAMPING) * uniform
                        + PAGE_RANK_DAMPING * (incoming + dangling * uniform)
                })
                .collect();
            ranks = next;
        }

        let mut scored: Vec<(&'g Revision, f64)> = self
            .inner
            .node_indices()
            .map(|idx| (self.inner[idx], ranks[idx.index()]))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        scored
    }

    fn out_degree(&self, idx: NodeIndex) -> usize {
        self.inner.neighbors_directed(idx, Direction::Outgoing).count()
    }

    /// The first `n` distinct products in PageRank order.
    pub fn top_products(&self, n: usize) -> Vec<ArtifactKey> {
        let mut products: Vec<ArtifactKey> = Vec::with_capacity(n);
        for (revision, _) in self.page_rank() {
            if products.len() == n {
                break;
            }
            if !products.contains(revision.artifact()) {
                products.push(revision.artifact().clone());
            }
        }
        products
    }

    /// One row per radius `1..=radius` and seed prefix `1..=p`.
    pub fn seed_stats(&self, selection: &SeedSelection, radius: usize) -> Vec<SeedStat> {
        let (products, ranked): (Vec<ArtifactKey>, Vec<&'g Revision>) = match selection {
            SeedSelection::Products(listed) => (listed.clone(), Vec::new()),
            SeedSelection::TopProducts(n) => (self.top_products(*n), Vec::new()),
            SeedSelection::TopRevisions(n) => (
                Vec::new(),
                self.page_rank().into_iter().take(*n).map(|(r, _)| r).collect(),
            ),
        };
        let prefixes = products.len().max(ranked.len());
        tracing::info!("Seed candidates: {} over radius 1..={}", prefixes, radius);

        let mut stats = Vec::new();
        for r in 1..=radius {
            for p in 1..=prefixes {
                let seeds: Vec<&Revision> = if ranked.is_empty() {
                    self.revisions_of_products(&products[..p])
                } else {
                    ranked[..p].to_vec()
                };
                let ball = self.backward_ball(&seeds, r);
                let closure = self.forward_closure_size(&ball);
                tracing::debug!(
                    "Backward visit (radius {}) expanded {} seeds to {}",
                    r,
                    seeds.len(),
                    ball.len()
                );
                stats.push(SeedStat {
                    radius: r,
                    seeds: p,
                    seed_revisions: seeds.len(),
                    ball: ball.len(),
                    closure,
                });
            }
        }
        stats
    }
}
