//! Metadata sources: where revisions and their dependency constraints come from

use crate::error::SourceError;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use weave_core::{
    ArtifactKey, Coordinate, DependencyConstraint, Exclusion, MAVEN_FORGE, Revision, Scope,
    VersionRange,
};

/// Read access to the ecosystem metadata the dependency graph is built from.
///
/// Implementations are only queried during the single-threaded build.
pub trait MetadataSource {
    /// Every artifact the source knows about.
    fn list_artifacts(&self) -> Result<Vec<ArtifactKey>, SourceError>;

    /// Published revisions of one artifact.
    fn list_revisions(&self, artifact: &ArtifactKey) -> Result<Vec<Revision>, SourceError>;

    /// Constraints declared by one revision.
    fn list_dependency_constraints(
        &self,
        revision: &Coordinate,
    ) -> Result<Vec<DependencyConstraint>, SourceError>;
}

/// Metadata held in memory, filled through builder calls.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadataSource {
    revisions: BTreeMap<ArtifactKey, Vec<Revision>>,
    constraints: HashMap<Coordinate, Vec<DependencyConstraint>>,
}

impl InMemoryMetadataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_revision(&mut self, revision: Revision) -> &mut Self {
        let versions = self.revisions.entry(revision.artifact().clone()).or_default();
        if !versions.contains(&revision) {
            versions.push(revision);
        }
        self
    }

    pub fn add_constraint(&mut self, constraint: DependencyConstraint) -> &mut Self {
        self.constraints
            .entry(constraint.source.clone())
            .or_default()
            .push(constraint);
        self
    }

    pub fn revision_count(&self) -> usize {
        self.revisions.values().map(Vec::len).sum()
    }
}

impl MetadataSource for InMemoryMetadataSource {
    fn list_artifacts(&self) -> Result<Vec<ArtifactKey>, SourceError> {
        Ok(self.revisions.keys().cloned().collect())
    }

    fn list_revisions(&self, artifact: &ArtifactKey) -> Result<Vec<Revision>, SourceError> {
        Ok(self.revisions.get(artifact).cloned().unwrap_or_default())
    }

    fn list_dependency_constraints(
        &self,
        revision: &Coordinate,
    ) -> Result<Vec<DependencyConstraint>, SourceError> {
        Ok(self.constraints.get(revision).cloned().unwrap_or_default())
    }
}

// ── JSON metadata dump ──────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevisionEntry {
    #[serde(default = "default_forge")]
    forge: String,
    group_id: String,
    artifact_id: String,
    version: String,
    #[serde(default)]
    release_timestamp: i64,
    #[serde(default)]
    dependencies: Vec<DependencyEntry>,
}

#[derive(Debug, Deserialize)]
struct DependencyEntry {
    /// `groupId:artifactId`
    product: String,
    #[serde(default)]
    constraints: Vec<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    exclusions: Vec<String>,
}

fn default_forge() -> String {
    MAVEN_FORGE.to_string()
}

/// Metadata loaded from a JSON array of revision records with their
/// declared dependencies.
///
/// Dependencies with an unparsable product, range, scope or exclusion are
/// skipped with a warning rather than failing the whole load.
#[derive(Debug, Clone, Default)]
pub struct JsonMetadataSource {
    inner: InMemoryMetadataSource,
    skipped: usize,
}

impl JsonMetadataSource {
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let entries: Vec<RevisionEntry> = serde_json::from_str(json)?;
        let mut inner = InMemoryMetadataSource::new();
        let mut skipped = 0;

        for entry in entries {
            let coordinate = Coordinate::new(
                entry.forge,
                entry.group_id,
                entry.artifact_id,
                entry.version,
            );
            for dep in entry.dependencies {
                match to_constraint(&coordinate, &dep) {
                    Ok(constraint) => {
                        inner.add_constraint(constraint);
                    }
                    Err(reason) => {
                        tracing::warn!(
                            "Skipping dependency {} of {}: {}",
                            dep.product,
                            coordinate,
                            reason
                        );
                        skipped += 1;
                    }
                }
            }
            inner.add_revision(Revision::new(coordinate, entry.release_timestamp));
        }

        tracing::info!(
            "Loaded {} revisions from metadata dump ({} dependencies skipped)",
            inner.revision_count(),
            skipped
        );
        Ok(JsonMetadataSource { inner, skipped })
    }

    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let json = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Number of dependency declarations that could not be parsed.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

fn to_constraint(source: &Coordinate, dep: &DependencyEntry) -> Result<DependencyConstraint, String> {
    let target: ArtifactKey = dep.product.parse().map_err(|e| format!("{}", e))?;
    let ranges = dep
        .constraints
        .iter()
        .map(|c| VersionRange::parse(c))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;
    let scope = match &dep.scope {
        Some(s) => s.parse::<Scope>().map_err(|e| e.to_string())?,
        None => Scope::default(),
    };
    let exclusions = dep
        .exclusions
        .iter()
        .map(|e| e.parse::<Exclusion>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;

    Ok(DependencyConstraint {
        source: source.clone(),
        target,
        ranges,
        scope,
        exclusions,
        optional: dep.optional,
    })
}

impl MetadataSource for JsonMetadataSource {
    fn list_artifacts(&self) -> Result<Vec<ArtifactKey>, SourceError> {
        self.inner.list_artifacts()
    }

    fn list_revisions(&self, artifact: &ArtifactKey) -> Result<Vec<Revision>, SourceError> {
        self.inner.list_revisions(artifact)
    }

    fn list_dependency_constraints(
        &self,
        revision: &Coordinate,
    ) -> Result<Vec<DependencyConstraint>, SourceError> {
        self.inner.list_dependency_constraints(revision)
    }
}
