//! Compilation settings, read from a TOML file.
//!
//! ```toml
//! [build]
//! ignore = ["InternalService"]
//! output_error_field = true
//!
//! [validate]
//! allow_empty_key = "allow_empty"
//! warnings_as_errors = false
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LoadError;

/// Default metadata key that marks an object as intentionally empty.
pub const DEFAULT_ALLOW_EMPTY_KEY: &str = "allow_empty";

/// Every compilation setting. Missing tables and keys take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The `[build]` table.
    pub build: BuildConfig,
    /// The `[validate]` table.
    pub validate: ValidateConfig,
}

/// Settings for the graph builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Declarations to skip, by name or qualified name.
    pub ignore: Vec<String>,
    /// Append an `Error string` field to every method output object.
    pub output_error_field: bool,
}

impl BuildConfig {
    /// True if the declaration is listed in `ignore`.
    pub fn is_ignored(&self, name: &str, qualified_name: &str) -> bool {
        self.ignore
            .iter()
            .any(|entry| entry == name || entry == qualified_name)
    }
}

/// Settings for the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidateConfig {
    /// Metadata flag that allows an object to have no fields.
    pub allow_empty_key: String,
    /// Treat every warning as fatal.
    pub warnings_as_errors: bool,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            allow_empty_key: DEFAULT_ALLOW_EMPTY_KEY.to_string(),
            warnings_as_errors: false,
        }
    }
}

impl Config {
    /// Parse settings from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, LoadError> {
        Ok(toml::from_str(contents)?)
    }

    /// Read and parse a TOML settings file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        debug!(path = %path.display(), "Loaded config.");
        Ok(config)
    }

    /// Load `path` when given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, LoadError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}
