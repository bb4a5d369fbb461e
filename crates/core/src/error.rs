//! Errors for loading inputs and rendering output.
//!
//! Problems with the declarations themselves are
//! [`Diagnostics`](crate::Diagnostics), not errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to read an input file (source set or configuration).
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The source set is not valid JSON for [`SourceSet`](crate::SourceSet).
    #[error("failed to parse source set: {0}")]
    SourceSet(#[from] serde_json::Error),

    /// The configuration is not valid TOML for [`Config`](crate::Config).
    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),
}

/// Failure to render IR into text.
#[derive(Debug, Error)]
pub enum RenderError {
    /// JSON serialization failed.
    #[error("failed to render IR as JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization failed.
    #[error("failed to render IR as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
