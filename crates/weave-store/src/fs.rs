//! Filesystem graph store
//!
//! Layout under the store root, one pair of files per revision:
//!
//! ```text
//! <root>/<forge>_<group>_<artifact>_<version>.bin   bincode-encoded graph document
//! <root>/<forge>_<group>_<artifact>_<version>.json  StoredGraphMeta
//! ```
//!
//! Each field is percent-encoded except for ASCII alphanumerics, `.` and
//! `-`, so `_` only ever separates fields and distinct revisions never
//! share a file.
//!
//! The graph file is written under a temporary name and renamed into
//! place, so a reader never sees a partially written entry. The metadata
//! file is written last; an entry without one is reported by the
//! integrity check.

use crate::error::StoreError;
use crate::store::{GraphStore, StoredGraphMeta};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use weave_core::{Coordinate, MergedCallGraph, MergedGraphDocument};

pub const GRAPH_EXTENSION: &str = "bin";
pub const META_EXTENSION: &str = "json";

pub struct FsGraphStore {
    root: PathBuf,
}

impl FsGraphStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(StoreError::unavailable(&root))?;
        tracing::debug!("Opened graph store at {}", root.display());
        Ok(FsGraphStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn stem(revision: &Coordinate) -> String {
        [
            revision.forge.as_str(),
            revision.group_id(),
            revision.artifact_id(),
            revision.version.as_str(),
        ]
        .map(encode_field)
        .join("_")
    }

    pub fn graph_path(&self, revision: &Coordinate) -> PathBuf {
        self.root
            .join(format!("{}.{}", Self::stem(revision), GRAPH_EXTENSION))
    }

    pub fn meta_path(&self, revision: &Coordinate) -> PathBuf {
        self.root
            .join(format!("{}.{}", Self::stem(revision), META_EXTENSION))
    }

    /// Graph files present in the store, including those without metadata.
    pub fn graph_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        self.files_with_extension(GRAPH_EXTENSION)
    }

    fn files_with_extension(&self, extension: &str) -> Result<Vec<PathBuf>, StoreError> {
        let entries = fs::read_dir(&self.root).map_err(StoreError::unavailable(&self.root))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(StoreError::unavailable(&self.root))?.path();
            if path.extension().is_some_and(|e| e == extension) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn read_meta(&self, path: &Path) -> Result<StoredGraphMeta, StoreError> {
        let contents = fs::read_to_string(path).map_err(StoreError::unavailable(path))?;
        serde_json::from_str(&contents).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Decode a graph file directly, bypassing the metadata.
    pub fn read_graph(&self, path: &Path) -> Result<MergedCallGraph, StoreError> {
        let file = File::open(path).map_err(StoreError::unavailable(path))?;
        let document: MergedGraphDocument = bincode::deserialize_from(BufReader::new(file))?;
        Ok(MergedCallGraph::from_document(document)?)
    }
}

fn encode_field(field: &str) -> String {
    let mut encoded = String::with_capacity(field.len());
    for byte in field.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'.' || byte == b'-' {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

impl GraphStore for FsGraphStore {
    fn put(&self, revision: &Coordinate, graph: &MergedCallGraph) -> Result<(), StoreError> {
        let path = self.graph_path(revision);
        if path.exists() {
            return Err(StoreError::AlreadyExists(revision.to_string()));
        }

        let staging = path.with_extension("tmp");
        {
            let file = File::create(&staging).map_err(StoreError::unavailable(&staging))?;
            let mut writer = BufWriter::new(file);
            bincode::serialize_into(&mut writer, &graph.to_document())?;
            writer.flush().map_err(StoreError::unavailable(&staging))?;
        }
        fs::rename(&staging, &path).map_err(StoreError::unavailable(&path))?;

        let meta = StoredGraphMeta::describe(revision, graph);
        let meta_path = self.meta_path(revision);
        let json = serde_json::to_string_pretty(&meta).map_err(|source| StoreError::Malformed {
            path: meta_path.clone(),
            source,
        })?;
        fs::write(&meta_path, json).map_err(StoreError::unavailable(&meta_path))?;

        tracing::info!(
            "Stored graph for {} ({} nodes, {} edges) at {}",
            revision,
            meta.node_count,
            meta.edge_count,
            meta.stored_at.to_rfc3339()
        );
        Ok(())
    }

    fn get(&self, revision: &Coordinate) -> Result<MergedCallGraph, StoreError> {
        let path = self.graph_path(revision);
        if !path.exists() {
            return Err(StoreError::NotFound(revision.to_string()));
        }
        self.read_graph(&path)
    }

    fn contains(&self, revision: &Coordinate) -> Result<bool, StoreError> {
        Ok(self.graph_path(revision).exists())
    }

    fn list(&self) -> Result<Vec<StoredGraphMeta>, StoreError> {
        let mut metas = self
            .files_with_extension(META_EXTENSION)?
            .iter()
            .map(|path| self.read_meta(path))
            .collect::<Result<Vec<_>, _>>()?;
        metas.sort_by(|a, b| a.coordinate.cmp(&b.coordinate));
        Ok(metas)
    }
}
