//! Matcher configuration.
//!
//! Defaults match the conventional layout of a test suite's schema
//! directory. Override via environment variables, a YAML/JSON file, or the
//! builder methods.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default directory searched for schema documents.
pub const DEFAULT_SCHEMA_ROOT: &str = "spec/support/api/schemas";

/// Configuration for a [`Matcher`](crate::Matcher).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatcherConfig {
    /// Directory holding schema documents.
    pub schema_root: PathBuf,
    /// Synthesize and write a schema when the requested one is absent.
    pub generate_missing: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            schema_root: PathBuf::from(DEFAULT_SCHEMA_ROOT),
            generate_missing: true,
        }
    }
}

impl MatcherConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `JSONM_SCHEMA_ROOT` (default: `spec/support/api/schemas`)
    /// - `JSONM_GENERATE_MISSING` (`true`/`false`/`1`/`0`, default: `true`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// [`from_env`](Self::from_env) against an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(root) = lookup("JSONM_SCHEMA_ROOT") {
            config.schema_root = PathBuf::from(root);
        }
        if let Some(raw) = lookup("JSONM_GENERATE_MISSING") {
            config.generate_missing = parse_flag("JSONM_GENERATE_MISSING", &raw)?;
        }
        Ok(config)
    }

    /// Load configuration from a YAML (or JSON) file. Missing fields take
    /// their defaults; unknown fields are rejected.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_yaml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn with_schema_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.schema_root = root.into();
        self
    }

    pub fn with_generate_missing(mut self, enabled: bool) -> Self {
        self.generate_missing = enabled;
        self
    }
}

fn parse_flag(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue(var.to_string(), raw.to_string())),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(String, String),
    #[error("cannot read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },
    #[error("invalid config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}
