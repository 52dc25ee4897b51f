//! Merge strategies
//!
//! A strategy decides whether a concrete method found by the hierarchy walk
//! is an acceptable dispatch target.

use crate::error::MergeError;
use crate::universe::Universe;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strategy {
    /// Class hierarchy analysis: every declaring type is a candidate.
    #[default]
    #[serde(rename = "CHA")]
    Cha,
    /// Only types instantiated somewhere in the merged universe.
    #[serde(rename = "RTA-like")]
    RtaLike,
}

impl FromStr for Strategy {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CHA" => Ok(Strategy::Cha),
            "RTA" | "RTA-LIKE" | "RTA_LIKE" => Ok(Strategy::RtaLike),
            _ => Err(MergeError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Cha => f.write_str("CHA"),
            Strategy::RtaLike => f.write_str("RTA-like"),
        }
    }
}

/// Acceptance test applied to each candidate declaring type.
pub trait TargetFilter: Send + Sync {
    fn strategy(&self) -> Strategy;

    /// Whether the filter relies on per-artifact instantiated-type data.
    fn needs_instantiation_data(&self) -> bool {
        false
    }

    fn accepts(&self, universe: &Universe<'_>, declaring_type: &str) -> bool;
}

pub struct ClassHierarchyFilter;

impl TargetFilter for ClassHierarchyFilter {
    fn strategy(&self) -> Strategy {
        Strategy::Cha
    }

    fn accepts(&self, _universe: &Universe<'_>, _declaring_type: &str) -> bool {
        true
    }
}

pub struct InstantiatedTypeFilter;

impl TargetFilter for InstantiatedTypeFilter {
    fn strategy(&self) -> Strategy {
        Strategy::RtaLike
    }

    fn needs_instantiation_data(&self) -> bool {
        true
    }

    fn accepts(&self, universe: &Universe<'_>, declaring_type: &str) -> bool {
        universe.is_instantiated(declaring_type)
    }
}

/// Factory function to create the filter of a strategy
pub fn create_filter(strategy: Strategy) -> Box<dyn TargetFilter> {
    match strategy {
        Strategy::Cha => Box::new(ClassHierarchyFilter),
        Strategy::RtaLike => Box::new(InstantiatedTypeFilter),
    }
}
