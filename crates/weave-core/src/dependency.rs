//! Version-constrained dependency edges

use crate::coordinate::{ArtifactKey, COORDINATE_SEPARATOR, Coordinate};
use crate::error::ParseError;
use crate::version::{MavenVersion, VersionRange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dependency scope as declared by the depending revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Compile,
    Runtime,
    Provided,
    Test,
    System,
    Import,
}

impl Scope {
    /// Scopes followed when a query does not ask for others.
    pub const DEFAULT_RESOLUTION: [Scope; 2] = [Scope::Compile, Scope::Runtime];
}

impl FromStr for Scope {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "compile" => Ok(Scope::Compile),
            "runtime" => Ok(Scope::Runtime),
            "provided" => Ok(Scope::Provided),
            "test" => Ok(Scope::Test),
            "system" => Ok(Scope::System),
            "import" => Ok(Scope::Import),
            other => Err(ParseError::UnknownScope(other.to_string())),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Compile => "compile",
            Scope::Runtime => "runtime",
            Scope::Provided => "provided",
            Scope::Test => "test",
            Scope::System => "system",
            Scope::Import => "import",
        };
        f.write_str(name)
    }
}

/// An excluded artifact pattern; `*` matches any group or artifact id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
}

impl Exclusion {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Exclusion {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    pub fn matches(&self, artifact: &ArtifactKey) -> bool {
        (self.group_id == "*" || self.group_id == artifact.group_id)
            && (self.artifact_id == "*" || self.artifact_id == artifact.artifact_id)
    }
}

impl FromStr for Exclusion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once(COORDINATE_SEPARATOR) {
            Some((g, a)) if !g.is_empty() && !a.is_empty() => Ok(Exclusion::new(g, a)),
            _ => Err(ParseError::InvalidArtifact(s.to_string())),
        }
    }
}

impl TryFrom<String> for Exclusion {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Exclusion> for String {
    fn from(e: Exclusion) -> Self {
        format!("{}{}{}", e.group_id, COORDINATE_SEPARATOR, e.artifact_id)
    }
}

/// A directed edge from a revision to "some revision of `target` whose
/// version satisfies `ranges`".
///
/// The edge is never bound to a concrete target revision; it is resolved at
/// query time against whatever revisions of the target are known then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyConstraint {
    pub source: Coordinate,
    pub target: ArtifactKey,
    /// Alternative range expressions; any of them may match. Empty means
    /// any version.
    #[serde(default)]
    pub ranges: Vec<VersionRange>,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
    #[serde(default)]
    pub optional: bool,
}

impl DependencyConstraint {
    pub fn new(source: Coordinate, target: ArtifactKey, range: VersionRange) -> Self {
        DependencyConstraint {
            source,
            target,
            ranges: vec![range],
            scope: Scope::Compile,
            exclusions: Vec::new(),
            optional: false,
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_exclusion(mut self, exclusion: Exclusion) -> Self {
        self.exclusions.push(exclusion);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn is_satisfied_by(&self, version: &MavenVersion) -> bool {
        self.ranges.is_empty() || self.ranges.iter().any(|r| r.contains(version))
    }

    /// The range expressions joined for display.
    pub fn range_expression(&self) -> String {
        if self.ranges.is_empty() {
            return "*".to_string();
        }
        self.ranges
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl fmt::Display for DependencyConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} {} ({})",
            self.source,
            self.target,
            self.range_expression(),
            self.scope
        )
    }
}
