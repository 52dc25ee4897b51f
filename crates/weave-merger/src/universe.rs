//! Merge universe: the contributing partial graphs and their global IDs
//!
//! The base graph always comes first and owns GIDs `[0, n_base)`. The
//! dependencies follow sorted by coordinate, each as one contiguous block,
//! so GID assignment does not depend on the order dependencies were passed
//! in.

use std::collections::{HashMap, HashSet};
use weave_core::{
    CallableNode, Coordinate, Degradation, ErrorClass, Gid, MethodUri, PartialCallGraph,
    SymbolIndex, TypeDecl, qualify_local,
};

/// One partial graph taking part in a merge.
pub struct Contributor<'a> {
    pub graph: &'a PartialCallGraph,
    /// First GID of this contributor's block.
    pub first_gid: Gid,
    /// Number of GIDs in the block.
    pub len: usize,
}

impl<'a> Contributor<'a> {
    pub fn coordinate(&self) -> &'a Coordinate {
        let graph: &'a PartialCallGraph = self.graph;
        graph.coordinate()
    }

    pub fn has_hierarchy(&self) -> bool {
        self.graph.class_hierarchy.is_some()
    }

    pub fn has_instantiation_data(&self) -> bool {
        self.graph.instantiated_types.is_some()
    }

    /// GID range of the block.
    pub fn gids(&self) -> std::ops::Range<u64> {
        self.first_gid.0..self.first_gid.0 + self.len as u64
    }
}

pub struct Universe<'a> {
    contributors: Vec<Contributor<'a>>,
    symbols: SymbolIndex,
    nodes: Vec<CallableNode>,
    /// Type URI -> contributors declaring it, in universe order.
    declarations: HashMap<&'a str, Vec<usize>>,
    /// Type URI -> types naming it as a supertype, in universe order.
    subtypes: HashMap<&'a str, Vec<&'a str>>,
    instantiated: HashSet<&'a str>,
    skipped: Vec<Degradation>,
}

impl<'a> Universe<'a> {
    pub fn build(base: &'a PartialCallGraph, dependencies: &'a [PartialCallGraph]) -> Self {
        let mut ordered: Vec<&'a PartialCallGraph> = dependencies.iter().collect();
        ordered.sort_by(|a, b| a.coordinate().cmp(b.coordinate()));

        let mut universe = Universe {
            contributors: Vec::with_capacity(ordered.len() + 1),
            symbols: SymbolIndex::new(),
            nodes: Vec::new(),
            declarations: HashMap::new(),
            subtypes: HashMap::new(),
            instantiated: HashSet::new(),
            skipped: Vec::new(),
        };

        let mut seen: HashSet<&Coordinate> = HashSet::new();
        for graph in std::iter::once(base).chain(ordered) {
            if !seen.insert(graph.coordinate()) {
                tracing::warn!("Skipping duplicate contribution of {}", graph.coordinate());
                universe.skipped.push(Degradation::new(
                    ErrorClass::MergeInputMalformed,
                    graph.coordinate().to_string(),
                    "duplicate coordinate in merge input, contribution skipped",
                ));
                continue;
            }
            universe.add(graph);
        }

        tracing::debug!(
            "Merge universe: {} contributors, {} internal nodes, {} types",
            universe.contributors.len(),
            universe.nodes.len(),
            universe.declarations.len()
        );
        universe
    }

    fn add(&mut self, graph: &'a PartialCallGraph) {
        let index = self.contributors.len();
        let coordinate = graph.coordinate();
        let first_gid = Gid(self.nodes.len() as u64);

        for local in &graph.internal_nodes {
            let global = qualify_local(coordinate, local);
            let gid = Gid(self.nodes.len() as u64);
            if !self
                .symbols
                .insert(global.clone(), local.clone(), gid)
            {
                tracing::debug!("Duplicate internal node {} in {}", local, coordinate);
                continue;
            }
            let owning_type = MethodUri::parse(local)
                .map(|uri| uri.type_uri())
                .unwrap_or_default();
            self.nodes.push(CallableNode::internal(global, owning_type));
        }

        if let Some(hierarchy) = &graph.class_hierarchy {
            for (type_uri, decl) in hierarchy.types() {
                self.declarations
                    .entry(type_uri.as_str())
                    .or_default()
                    .push(index);
                for supertype in decl.supertypes() {
                    let subs = self.subtypes.entry(supertype.as_str()).or_default();
                    if !subs.contains(&type_uri.as_str()) {
                        subs.push(type_uri.as_str());
                    }
                }
            }
        }

        if let Some(types) = &graph.instantiated_types {
            self.instantiated.extend(types.iter().map(String::as_str));
        }

        self.contributors.push(Contributor {
            graph,
            first_gid,
            len: self.nodes.len() - first_gid.index(),
        });
    }

    pub fn contributors(&self) -> &[Contributor<'a>] {
        &self.contributors
    }

    pub fn contributor(&self, index: usize) -> &Contributor<'a> {
        &self.contributors[index]
    }

    pub fn symbols(&self) -> &SymbolIndex {
        &self.symbols
    }

    /// Internal nodes in GID order.
    pub fn nodes(&self) -> &[CallableNode] {
        &self.nodes
    }

    /// Contributions dropped while building the universe.
    pub fn skipped(&self) -> &[Degradation] {
        &self.skipped
    }

    /// GID of a method defined by a contributor, by its local URI.
    pub fn lookup_method(&self, contributor: usize, local: &str) -> Option<Gid> {
        let coordinate = self.contributors.get(contributor)?.coordinate();
        self.symbols.lookup(&qualify_local(coordinate, local))
    }

    /// Contributors declaring a type, in universe order.
    pub fn declaring_contributors(&self, type_uri: &str) -> &[usize] {
        self.declarations
            .get(type_uri)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Declaration of a type, preferring the given contributor's own copy
    /// and falling back to the first declaring contributor.
    pub fn declaration(&self, type_uri: &str, prefer: usize) -> Option<(usize, &'a TypeDecl)> {
        let owners = self.declarations.get(type_uri)?;
        let owner = if owners.contains(&prefer) {
            prefer
        } else {
            *owners.first()?
        };
        let graph: &'a PartialCallGraph = self.contributors[owner].graph;
        let decl = graph.class_hierarchy.as_ref()?.get(type_uri)?;
        Some((owner, decl))
    }

    /// Direct subtypes of a type across all contributors.
    pub fn subtypes(&self, type_uri: &str) -> &[&'a str] {
        self.subtypes
            .get(type_uri)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_instantiated(&self, type_uri: &str) -> bool {
        self.instantiated.contains(type_uri)
    }
}
