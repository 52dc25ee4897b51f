//! Method URIs
//!
//! A method is named by a URI of the form
//! `/namespace/Type.method(params)return`. Inside a partial call graph the
//! URI is local to the owning artifact; the merger qualifies it with the
//! artifact's coordinate, giving the global form
//! `fasten://mvn!group:artifact$version/namespace/Type.method(params)return`.

use crate::coordinate::Coordinate;
use crate::error::ParseError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

pub const URI_SCHEME: &str = "fasten://";

static GLOBAL_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^fasten://(?P<forge>[^!/]+)!(?P<product>[^$/]+)\$(?P<version>[^/]*)(?P<local>/.*)$")
        .expect("global URI pattern is valid")
});

static LOCAL_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(?P<namespace>[^/]*)/(?P<type>[^/(]+)\.(?P<signature>[^./(]+\(.*)$")
        .expect("local URI pattern is valid")
});

/// The artifact part of a global URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UriAuthority {
    pub forge: String,
    /// `groupId:artifactId`
    pub product: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodUri {
    pub authority: Option<UriAuthority>,
    pub namespace: String,
    /// Simple type name, possibly nested (`Outer$Inner`).
    pub type_name: String,
    /// Method name followed by its descriptor, e.g. `f()V`.
    pub signature: String,
}

impl MethodUri {
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let s = s.trim();
        if let Some(caps) = GLOBAL_URI.captures(s) {
            let mut local = MethodUri::parse_local(&caps["local"])
                .ok_or_else(|| ParseError::InvalidUri(s.to_string()))?;
            local.authority = Some(UriAuthority {
                forge: caps["forge"].to_string(),
                product: caps["product"].to_string(),
                version: caps["version"].to_string(),
            });
            return Ok(local);
        }
        if s.starts_with(URI_SCHEME) {
            return Err(ParseError::InvalidUri(s.to_string()));
        }
        MethodUri::parse_local(s).ok_or_else(|| ParseError::InvalidUri(s.to_string()))
    }

    fn parse_local(s: &str) -> Option<Self> {
        let caps = LOCAL_URI.captures(s)?;
        Some(MethodUri {
            authority: None,
            namespace: caps["namespace"].to_string(),
            type_name: caps["type"].to_string(),
            signature: caps["signature"].to_string(),
        })
    }

    /// The declaring type as it appears in class hierarchies: `/ns/Type`.
    pub fn type_uri(&self) -> String {
        format!("/{}/{}", self.namespace, self.type_name)
    }

    /// The URI without its artifact authority.
    pub fn local(&self) -> String {
        format!("/{}/{}.{}", self.namespace, self.type_name, self.signature)
    }

    pub fn is_global(&self) -> bool {
        self.authority.is_some()
    }
}

/// Global URI string of a local URI owned by `owner`.
pub fn qualify_local(owner: &Coordinate, local: &str) -> String {
    format!("{}{}{}", URI_SCHEME, owner.qualified(), local)
}

impl fmt::Display for MethodUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(a) = &self.authority {
            write!(f, "{}{}!{}${}", URI_SCHEME, a.forge, a.product, a.version)?;
        }
        f.write_str(&self.local())
    }
}

impl FromStr for MethodUri {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MethodUri::parse(s)
    }
}

impl TryFrom<String> for MethodUri {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MethodUri::parse(&value)
    }
}

impl From<MethodUri> for String {
    fn from(uri: MethodUri) -> Self {
        uri.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_uri() {
        let uri = MethodUri::parse("/com.example/Outer$Inner.run(%2Fjava.lang%2FString)V").unwrap();
        assert_eq!(uri.namespace, "com.example");
        assert_eq!(uri.type_name, "Outer$Inner");
        assert_eq!(uri.signature, "run(%2Fjava.lang%2FString)V");
        assert_eq!(uri.type_uri(), "/com.example/Outer$Inner");
        assert!(!uri.is_global());
    }

    #[test]
    fn test_qualify_round_trips_through_display() {
        let owner = Coordinate::maven("org.acme", "lib", "1.2");
        let text = qualify_local(&owner, "/org.acme/Lib.<init>()V");
        assert_eq!(text, "fasten://mvn!org.acme:lib$1.2/org.acme/Lib.<init>()V");
        let uri = MethodUri::parse(&text).unwrap();
        assert!(uri.is_global());
        assert_eq!(uri.local(), "/org.acme/Lib.<init>()V");
        assert_eq!(uri.to_string(), text);
    }

    #[test]
    fn test_reject_malformed() {
        assert!(MethodUri::parse("Lib.f()V").is_err());
        assert!(MethodUri::parse("/ns/Lib").is_err());
        assert!(MethodUri::parse("fasten://mvn/ns/Lib.f()V").is_err());
    }
}
