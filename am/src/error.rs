//! Error types for the template registry

use std::path::PathBuf;
use thiserror::Error;

/// Reasons a template source is rejected during load
///
/// These never escape `load`/`load_all`; they are reported inside the
/// load outcome so the caller can log them.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML source {name}: {source}")]
    Yaml {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse JSON source {name}: {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Source {name} must be a mapping at the top level, found {found}")]
    NotAMapping { name: String, found: &'static str },

    #[error("Source {name} has an unsupported {found} at '{path}'")]
    UnsupportedNode {
        name: String,
        path: String,
        found: &'static str,
    },

    #[error("Failed to expand merge keys in {name}: {source}")]
    Merge {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Source {name} has a non-scalar key under '{path}'")]
    InvalidKey { name: String, path: String },

    #[error("Source {name} defines '{path}' more than once")]
    DuplicateKey { name: String, path: String },
}

/// Caller contract violations on the registry's write API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Message key must not be empty (path '{path}')")]
    EmptyKey { path: String },
}

/// Failure turning a serializable value into a parameter map
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Failed to serialize parameters: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Parameters must serialize to a map, found {found}")]
    NotAMap { found: &'static str },
}
