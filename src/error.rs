//! Error types for the test-description compiler.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all compiler operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing or invalid `{0}` key in test description root")]
    MissingKey(&'static str),

    #[error("Found unknown key(s) in {context}: {keys}")]
    UnknownKeys { context: String, keys: String },

    #[error("Found non-string key at {path}")]
    NonStringKey { path: String },

    #[error("{context} must be {expected}")]
    WrongType {
        context: String,
        expected: &'static str,
    },

    #[error("Invalid severity {0:?}, expected \"i\", \"w\", or \"e\"")]
    InvalidSeverity(String),

    #[error("Unknown field {field} for {message}")]
    UnknownField { field: String, message: String },

    #[error("Unexpected index in path description, currently at {message}")]
    UnexpectedIndex { message: String },

    #[error("Ran out of path elements for repeated field {field} of {message}")]
    MissingIndex { field: String, message: String },

    #[error("Found non-index path element for repeated field {field} of {message}")]
    NonIndexElement { field: String, message: String },

    #[error("Failed to parse {0:?} as a path element")]
    PathElementSyntax(String),
}

pub type Result<T> = std::result::Result<T, Error>;
