//! Symbol index for cross-artifact resolution

use crate::model::Gid;
use dashmap::DashMap;

/// Maps method URIs to GIDs. Thread-safe for concurrent lookups once filled.
///
/// Global URIs are unique. Local URIs may be defined by several artifacts
/// (shaded or duplicated classes); the first artifact to register one keeps
/// it, so callers must insert in universe order.
pub struct SymbolIndex {
    symbols: DashMap<String, Gid>,
    local_symbols: DashMap<String, Gid>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        SymbolIndex {
            symbols: DashMap::new(),
            local_symbols: DashMap::new(),
        }
    }

    /// Insert an internal symbol. Returns false if the global URI was
    /// already present, in which case nothing changes.
    pub fn insert(&self, global_uri: String, local_uri: String, gid: Gid) -> bool {
        if self.symbols.contains_key(&global_uri) {
            return false;
        }
        self.symbols.insert(global_uri, gid);
        self.local_symbols.entry(local_uri).or_insert(gid);
        true
    }

    /// Look up a symbol by global URI.
    pub fn lookup(&self, global_uri: &str) -> Option<Gid> {
        self.symbols.get(global_uri).map(|r| *r.value())
    }

    /// Look up the first registered definition of a local URI.
    pub fn lookup_local(&self, local_uri: &str) -> Option<Gid> {
        self.local_symbols.get(local_uri).map(|r| *r.value())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for SymbolIndex {
    fn default() -> Self {
        Self::new()
    }
}
