//! Error types for search data handling

use std::path::PathBuf;

use thiserror::Error;

/// Malformed `searchData` / `searchdata.js` text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    /// 1-based
    pub line: usize,
    /// 1-based, counted in characters
    pub column: usize,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("entry #{position} has an empty key")]
    EmptyKey { position: usize },

    #[error("duplicate key '{key}' at entries #{first} and #{second}")]
    DuplicateKey {
        key: String,
        first: usize,
        second: usize,
    },

    #[error("entry '{key}' has no locations")]
    NoLocations { key: String },

    #[error("invalid search id '{id}' at byte {offset}")]
    InvalidSearchId { id: String, offset: usize },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?}: {source}")]
    Shard {
        path: PathBuf,
        #[source]
        source: Box<IndexError>,
    },
}

/// Invalid environment configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is not a valid {expected}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}
