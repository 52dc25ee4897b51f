//! Repository of pre-extracted partial call graphs
//!
//! Partial graphs are produced by an external extractor and dropped into a
//! directory tree keyed by coordinate:
//!
//! ```text
//! <root>/<first letter of artifactId>/<artifactId>/<artifactId>_<groupId>_<version>.json
//! ```

use crate::error::StoreError;
use std::fs;
use std::path::{Path, PathBuf};
use weave_core::{Coordinate, PartialCallGraph};

/// Where the partial graph of an analysis comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisInput {
    /// A partial call graph document on disk.
    File(PathBuf),
    /// A coordinate looked up in the repository.
    Coordinate(Coordinate),
}

impl std::fmt::Display for AnalysisInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisInput::File(path) => write!(f, "{}", path.display()),
            AnalysisInput::Coordinate(coordinate) => write!(f, "{}", coordinate),
        }
    }
}

pub struct PartialGraphRepository {
    root: PathBuf,
}

impl PartialGraphRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PartialGraphRepository { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, coordinate: &Coordinate) -> PathBuf {
        let artifact = coordinate.artifact_id();
        let prefix: String = artifact.chars().take(1).collect();
        self.root.join(prefix).join(artifact).join(format!(
            "{}_{}_{}.json",
            artifact,
            coordinate.group_id(),
            coordinate.version
        ))
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.path_for(coordinate).is_file()
    }

    pub fn load(&self, coordinate: &Coordinate) -> Result<PartialCallGraph, StoreError> {
        let path = self.path_for(coordinate);
        if !path.is_file() {
            return Err(StoreError::NotFound(coordinate.to_string()));
        }
        let graph = read_partial_graph(&path)?;
        if graph.coordinate() != coordinate {
            tracing::warn!(
                "{} holds the graph of {}, expected {}",
                path.display(),
                graph.coordinate(),
                coordinate
            );
        }
        Ok(graph)
    }

    /// Write a partial graph into its place in the tree, replacing any
    /// previous extraction of the same coordinate.
    pub fn save(&self, graph: &PartialCallGraph) -> Result<PathBuf, StoreError> {
        let path = self.path_for(graph.coordinate());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(StoreError::unavailable(parent))?;
        }
        let json = graph.to_json().map_err(|source| StoreError::Malformed {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(StoreError::unavailable(&path))?;
        Ok(path)
    }

    /// Load the partial graph an analysis input names.
    pub fn load_input(&self, input: &AnalysisInput) -> Result<PartialCallGraph, StoreError> {
        match input {
            AnalysisInput::File(path) => read_partial_graph(path),
            AnalysisInput::Coordinate(coordinate) => self.load(coordinate),
        }
    }

    /// Load the graphs of several coordinates, skipping those the
    /// repository does not hold. Returns the loaded graphs and the
    /// coordinates that were missing.
    pub fn load_available(
        &self,
        coordinates: &[Coordinate],
    ) -> Result<(Vec<PartialCallGraph>, Vec<Coordinate>), StoreError> {
        let mut graphs = Vec::with_capacity(coordinates.len());
        let mut missing = Vec::new();
        for coordinate in coordinates {
            match self.load(coordinate) {
                Ok(graph) => graphs.push(graph),
                Err(StoreError::NotFound(_)) => {
                    tracing::debug!("No partial graph for {} in the repository", coordinate);
                    missing.push(coordinate.clone());
                }
                Err(e) => return Err(e),
            }
        }
        Ok((graphs, missing))
    }
}

pub fn read_partial_graph(path: &Path) -> Result<PartialCallGraph, StoreError> {
    let json = fs::read_to_string(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => StoreError::NotFound(path.display().to_string()),
        _ => StoreError::Unavailable {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let graph = PartialCallGraph::from_json(&json).map_err(|source| StoreError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    for problem in graph.validate() {
        tracing::warn!("{}: {}", path.display(), problem);
    }
    Ok(graph)
}
