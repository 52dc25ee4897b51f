//! Error taxonomy shared by the resolver, merger and stores

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to parse one of the textual identifiers of the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid coordinate '{0}', expected groupId:artifactId:version")]
    InvalidCoordinate(String),
    #[error("invalid artifact '{0}', expected groupId:artifactId")]
    InvalidArtifact(String),
    #[error("invalid version '{0}'")]
    InvalidVersion(String),
    #[error("invalid version range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },
    #[error("invalid method URI '{0}'")]
    InvalidUri(String),
    #[error("unknown call type: {0}")]
    UnknownCallKind(String),
    #[error("unknown dependency scope: {0}")]
    UnknownScope(String),
}

/// The error classes a resolution or merge can run into.
///
/// Most of them are absorbed into a best-effort result as a [`Degradation`];
/// only `StorageUnavailable` and a `MissingRevision` outside of
/// ignore-missing mode abort an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorClass {
    MissingRevision,
    UnresolvableConstraint,
    DependencyCycle,
    MergeInputMalformed,
    StorageUnavailable,
}

impl ErrorClass {
    /// Whether this class aborts the operation it occurs in.
    pub fn is_fatal(self, ignore_missing: bool) -> bool {
        match self {
            ErrorClass::StorageUnavailable => true,
            ErrorClass::MissingRevision => !ignore_missing,
            ErrorClass::UnresolvableConstraint
            | ErrorClass::DependencyCycle
            | ErrorClass::MergeInputMalformed => false,
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorClass::MissingRevision => "MissingRevision",
            ErrorClass::UnresolvableConstraint => "UnresolvableConstraint",
            ErrorClass::DependencyCycle => "DependencyCycle",
            ErrorClass::MergeInputMalformed => "MergeInputMalformed",
            ErrorClass::StorageUnavailable => "StorageUnavailable",
        };
        f.write_str(name)
    }
}

/// A non-fatal problem attached to a partial result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Degradation {
    pub class: ErrorClass,
    /// The coordinate, constraint or artifact the problem is about.
    pub subject: String,
    pub detail: String,
}

impl Degradation {
    pub fn new(class: ErrorClass, subject: impl Into<String>, detail: impl Into<String>) -> Self {
        Degradation {
            class,
            subject: subject.into(),
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.class, self.subject, self.detail)
    }
}
