//! Configuration: `weave.toml`, then `WEAVE_*` environment variables

use crate::dependency::Scope;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "weave.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WeaveConfig {
    pub resolver: ResolverConfig,
    pub merger: MergerConfig,
    pub store: StoreConfig,
    pub repository: RepositoryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Skip constraints whose target artifact is wholly unknown.
    pub ignore_missing: bool,
    /// Scopes followed during resolution.
    pub scopes: Vec<Scope>,
    /// Follow optional dependencies declared by the queried revision.
    pub include_optional: bool,
    /// JSON metadata file used to build the dependency graph.
    pub metadata: Option<PathBuf>,
    /// Serialized graph snapshot to restore instead of rebuilding.
    pub snapshot: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            ignore_missing: false,
            scopes: Scope::DEFAULT_RESOLUTION.to_vec(),
            include_optional: true,
            metadata: None,
            snapshot: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergerConfig {
    /// `CHA` or `RTA-like`.
    pub strategy: String,
    /// Also resolve the dependencies' own call sites.
    pub deep: bool,
}

impl Default for MergerConfig {
    fn default() -> Self {
        MergerConfig {
            strategy: "CHA".to_string(),
            deep: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: PathBuf::from(".weave/graphs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Root of the partial call graph repository.
    pub path: PathBuf,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            path: PathBuf::from(".weave/callgraphs"),
        }
    }
}

impl WeaveConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from `path`, or from `weave.toml` in the working directory if it
    /// exists, or defaults; then apply `WEAVE_*` variables (including those
    /// from a `.env` file).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let default_path = PathBuf::from(CONFIG_FILE);
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None if default_path.exists() => Some(default_path),
            None => None,
        };

        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                tracing::debug!("Loaded config from {}", path.display());
                Self::from_toml_str(&text)?
            }
            None => WeaveConfig::default(),
        };

        if let Ok(env_file) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", env_file.display());
        }
        config.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup("WEAVE_IGNORE_MISSING") {
            self.resolver.ignore_missing = parse_bool("WEAVE_IGNORE_MISSING", &v)?;
        }
        if let Some(v) = lookup("WEAVE_SCOPES") {
            self.resolver.scopes = v
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| {
                    s.parse().map_err(|_| ConfigError::InvalidValue {
                        key: "WEAVE_SCOPES".to_string(),
                        value: v.clone(),
                    })
                })
                .collect::<Result<_, _>>()?;
        }
        if let Some(v) = lookup("WEAVE_METADATA") {
            self.resolver.metadata = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("WEAVE_SNAPSHOT") {
            self.resolver.snapshot = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("WEAVE_STRATEGY") {
            self.merger.strategy = v;
        }
        if let Some(v) = lookup("WEAVE_DEEP_MERGE") {
            self.merger.deep = parse_bool("WEAVE_DEEP_MERGE", &v)?;
        }
        if let Some(v) = lookup("WEAVE_STORE_PATH") {
            self.store.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("WEAVE_REPOSITORY_PATH") {
            self.repository.path = PathBuf::from(v);
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
