//! Artifact coordinates and published revisions

use crate::error::ParseError;
use crate::version::MavenVersion;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Forge tag of the Maven ecosystem.
pub const MAVEN_FORGE: &str = "mvn";

/// Separator between group, artifact and version in coordinate strings.
pub const COORDINATE_SEPARATOR: char = ':';

/// An artifact independent of its version: `groupId:artifactId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactKey {
    pub group_id: String,
    pub artifact_id: String,
}

impl ArtifactKey {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        ArtifactKey {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.group_id, COORDINATE_SEPARATOR, self.artifact_id)
    }
}

impl FromStr for ArtifactKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split(COORDINATE_SEPARATOR).collect::<Vec<_>>().as_slice() {
            [group, artifact] if !group.is_empty() && !artifact.is_empty() => {
                Ok(ArtifactKey::new(*group, *artifact))
            }
            _ => Err(ParseError::InvalidArtifact(s.to_string())),
        }
    }
}

/// Identity of one published revision: forge, artifact and version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "CoordinateRecord", into = "CoordinateRecord")]
pub struct Coordinate {
    pub forge: String,
    pub artifact: ArtifactKey,
    pub version: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoordinateRecord {
    forge: String,
    group_id: String,
    artifact_id: String,
    version: String,
}

impl From<CoordinateRecord> for Coordinate {
    fn from(r: CoordinateRecord) -> Self {
        Coordinate {
            forge: r.forge,
            artifact: ArtifactKey::new(r.group_id, r.artifact_id),
            version: r.version,
        }
    }
}

impl From<Coordinate> for CoordinateRecord {
    fn from(c: Coordinate) -> Self {
        CoordinateRecord {
            forge: c.forge,
            group_id: c.artifact.group_id,
            artifact_id: c.artifact.artifact_id,
            version: c.version,
        }
    }
}

impl Coordinate {
    pub fn new(
        forge: impl Into<String>,
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Coordinate {
            forge: forge.into(),
            artifact: ArtifactKey::new(group_id, artifact_id),
            version: version.into(),
        }
    }

    /// Shorthand for a coordinate on the Maven forge.
    pub fn maven(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Coordinate::new(MAVEN_FORGE, group_id, artifact_id, version)
    }

    /// Parse `groupId:artifactId:version` for the given forge.
    pub fn parse(forge: &str, s: &str) -> Result<Self, ParseError> {
        match s.trim().split(COORDINATE_SEPARATOR).collect::<Vec<_>>().as_slice() {
            [group, artifact, version]
                if !group.is_empty() && !artifact.is_empty() && !version.is_empty() =>
            {
                Ok(Coordinate::new(forge, *group, *artifact, *version))
            }
            _ => Err(ParseError::InvalidCoordinate(s.to_string())),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.artifact.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact.artifact_id
    }

    pub fn parsed_version(&self) -> MavenVersion {
        MavenVersion::parse(&self.version)
    }

    /// Forge-qualified form used as the authority of global method URIs:
    /// `mvn!group:artifact$version`.
    pub fn qualified(&self) -> String {
        format!("{}!{}${}", self.forge, self.artifact, self.version)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.artifact, COORDINATE_SEPARATOR, self.version)
    }
}

impl FromStr for Coordinate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Coordinate::parse(MAVEN_FORGE, s)
    }
}

impl Ord for Coordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.forge
            .cmp(&other.forge)
            .then_with(|| self.artifact.cmp(&other.artifact))
            .then_with(|| self.parsed_version().cmp(&other.parsed_version()))
            .then_with(|| self.version.cmp(&other.version))
    }
}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One immutable published version of an artifact.
///
/// Identity is the coordinate alone; the release timestamp only approximates
/// publication order and takes no part in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RevisionRecord", into = "RevisionRecord")]
pub struct Revision {
    pub coordinate: Coordinate,
    /// Seconds since the epoch; 0 when unknown.
    pub release_timestamp: i64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevisionRecord {
    forge: String,
    group_id: String,
    artifact_id: String,
    version: String,
    #[serde(default)]
    release_timestamp: i64,
}

impl From<RevisionRecord> for Revision {
    fn from(r: RevisionRecord) -> Self {
        Revision {
            coordinate: Coordinate::new(r.forge, r.group_id, r.artifact_id, r.version),
            release_timestamp: r.release_timestamp,
        }
    }
}

impl From<Revision> for RevisionRecord {
    fn from(r: Revision) -> Self {
        RevisionRecord {
            forge: r.coordinate.forge,
            group_id: r.coordinate.artifact.group_id,
            artifact_id: r.coordinate.artifact.artifact_id,
            version: r.coordinate.version,
            release_timestamp: r.release_timestamp,
        }
    }
}

impl Revision {
    pub fn new(coordinate: Coordinate, release_timestamp: i64) -> Self {
        Revision {
            coordinate,
            release_timestamp,
        }
    }

    pub fn artifact(&self) -> &ArtifactKey {
        &self.coordinate.artifact
    }

    pub fn version(&self) -> &str {
        &self.coordinate.version
    }
}

impl PartialEq for Revision {
    fn eq(&self, other: &Self) -> bool {
        self.coordinate == other.coordinate
    }
}

impl Eq for Revision {}

impl Hash for Revision {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coordinate.hash(state);
    }
}

impl Ord for Revision {
    fn cmp(&self, other: &Self) -> Ordering {
        self.coordinate.cmp(&other.coordinate)
    }
}

impl PartialOrd for Revision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.coordinate, self.release_timestamp)
    }
}
