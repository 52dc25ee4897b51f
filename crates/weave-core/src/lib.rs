//! Weave Core: coordinate and URI model, versions, class hierarchies, and call graphs

pub mod config;
pub mod coordinate;
pub mod dependency;
pub mod error;
pub mod graph;
pub mod hierarchy;
pub mod model;
pub mod partial;
pub mod symbols;
pub mod uri;
pub mod version;


#[cfg(test)]
pub mod test_utils;

pub use config::{ConfigError, WeaveConfig, CONFIG_FILE};
pub use coordinate::{ArtifactKey, Coordinate, Revision, MAVEN_FORGE};
pub use dependency::{DependencyConstraint, Exclusion, Scope};
pub use error::{Degradation, ErrorClass, ParseError};
pub use graph::{GraphError, MergedCallGraph};
pub use hierarchy::{ClassHierarchy, TypeDecl};
pub use model::{CallMetadata, CallableNode, EdgeRecord, Gid, MergedGraphDocument, NodeRecord};
pub use partial::{CallEdge, CallKind, PartialCallGraph};
pub use symbols::SymbolIndex;
pub use uri::{qualify_local, MethodUri, UriAuthority, URI_SCHEME};
pub use version::{MavenVersion, VersionRange};
