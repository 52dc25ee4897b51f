//! Call site resolution against the merge universe
//!
//! Static and special calls are looked up by URI. Virtual and interface
//! calls enumerate the possible receiver types (the declared type and its
//! subtypes) and walk upward from each receiver until a concrete
//! declaration accepted by the strategy is found. Dynamic calls are never
//! resolved.

use crate::strategy::TargetFilter;
use crate::universe::Universe;
use std::collections::{HashSet, VecDeque};
use weave_core::{CallEdge, CallKind, Gid, MethodUri};

/// Outcome for one call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResolution {
    /// The caller is not an internal node of its partial graph.
    Dropped,
    Resolved { caller: Gid, targets: Vec<Gid> },
    /// Goes to the placeholder of the callee reference.
    Unresolved { caller: Gid },
}

pub struct Dispatcher<'u, 'a> {
    universe: &'u Universe<'a>,
}

impl<'u, 'a> Dispatcher<'u, 'a> {
    pub fn new(universe: &'u Universe<'a>) -> Self {
        Dispatcher { universe }
    }

    /// Resolve a call site of contributor `block`.
    ///
    /// `use_hierarchy` is false when the contributor shipped no class
    /// hierarchy; its virtual and interface calls then stay unresolved unless
    /// the callee is a global URI of an internal node.
    pub fn resolve(
        &self,
        block: usize,
        edge: &CallEdge,
        use_hierarchy: bool,
        filter: &dyn TargetFilter,
    ) -> CallResolution {
        let Some(caller) = self.universe.lookup_method(block, &edge.caller) else {
            return CallResolution::Dropped;
        };

        let targets = match edge.kind {
            CallKind::Dynamic => Vec::new(),
            _ => match MethodUri::parse(&edge.callee_ref) {
                Err(_) => Vec::new(),
                Ok(callee) => match edge.kind {
                    CallKind::Virtual | CallKind::Interface => {
                        let found = if use_hierarchy {
                            self.resolve_dispatched(block, &callee, edge.kind, filter)
                        } else {
                            Vec::new()
                        };
                        // A global reference naming an internal method links
                        // to it even when the walk finds nothing.
                        if found.is_empty() && callee.is_global() {
                            self.resolve_exact(block, &callee).into_iter().collect()
                        } else {
                            found
                        }
                    }
                    _ => self.resolve_exact(block, &callee).into_iter().collect(),
                },
            },
        };

        if targets.is_empty() {
            CallResolution::Unresolved { caller }
        } else {
            CallResolution::Resolved { caller, targets }
        }
    }

    /// The caller's own artifact first, then the artifacts declaring the
    /// callee's type, then any contributor defining the same local URI.
    fn resolve_exact(&self, block: usize, callee: &MethodUri) -> Option<Gid> {
        let symbols = self.universe.symbols();
        if callee.is_global() {
            return symbols.lookup(&callee.to_string());
        }

        let local = callee.local();
        if let Some(gid) = self.universe.lookup_method(block, &local) {
            return Some(gid);
        }
        self.universe
            .declaring_contributors(&callee.type_uri())
            .iter()
            .find_map(|&owner| self.universe.lookup_method(owner, &local))
            .or_else(|| symbols.lookup_local(&local))
    }

    fn resolve_dispatched(
        &self,
        block: usize,
        callee: &MethodUri,
        kind: CallKind,
        filter: &dyn TargetFilter,
    ) -> Vec<Gid> {
        let declared = callee.type_uri();

        // Receiver types in breadth order over the merged subtype relation.
        let mut receivers: Vec<&str> = vec![declared.as_str()];
        let mut seen: HashSet<&str> = HashSet::from([declared.as_str()]);
        let mut next = 0;
        while next < receivers.len() {
            for &subtype in self.universe.subtypes(receivers[next]) {
                if seen.insert(subtype) {
                    receivers.push(subtype);
                }
            }
            next += 1;
        }

        let mut targets = Vec::new();
        for receiver in receivers {
            if let Some(gid) = self.walk_up(block, receiver, &callee.signature, kind, filter) {
                if !targets.contains(&gid) {
                    targets.push(gid);
                }
            }
        }
        targets
    }

    /// Breadth-first walk from `receiver` towards its ancestors. Virtual
    /// calls follow superclasses; interface calls follow superclasses and
    /// then superinterfaces.
    fn walk_up(
        &self,
        block: usize,
        receiver: &str,
        signature: &str,
        kind: CallKind,
        filter: &dyn TargetFilter,
    ) -> Option<Gid> {
        let mut queue: VecDeque<&str> = VecDeque::from([receiver]);
        let mut visited: HashSet<&str> = HashSet::from([receiver]);

        while let Some(type_uri) = queue.pop_front() {
            let Some((owner, decl)) = self.universe.declaration(type_uri, block) else {
                continue;
            };
            if decl.defines(signature) && filter.accepts(self.universe, type_uri) {
                let method = format!("{}.{}", type_uri, signature);
                if let Some(gid) = self.universe.lookup_method(owner, &method) {
                    return Some(gid);
                }
            }

            let ancestors: Vec<&String> = match kind {
                CallKind::Interface => decl.supertypes().collect(),
                _ => decl.super_classes.iter().collect(),
            };
            for ancestor in ancestors {
                if visited.insert(ancestor.as_str()) {
                    queue.push_back(ancestor.as_str());
                }
            }
        }
        None
    }
}
