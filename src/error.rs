//! Centralized error types for slacksearch.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the slacksearch library.
#[derive(Error, Debug)]
pub enum SearchError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A JSON file in the archive could not be decoded.
    #[error("Invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The archive path does not exist.
    #[error("Archive not found: {0}")]
    ArchiveNotFound(PathBuf),

    /// The query string could not be parsed.
    #[error("Malformed query '{query}': {reason}")]
    MalformedQuery { query: String, reason: String },

    /// A message record breaks the archive's invariants.
    ///
    /// This aborts the whole run: partial results over a corrupt archive
    /// would be misleading.
    #[error("Malformed message record in channel '{channel}': {reason}")]
    MalformedRecord { channel: String, reason: String },
}

/// Convenience alias for `Result<T, SearchError>`.
pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `Json` variant from a path and a decoding error.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn query(query: &str, reason: impl Into<String>) -> Self {
        Self::MalformedQuery {
            query: query.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn record(channel: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            channel: channel.to_string(),
            reason: reason.into(),
        }
    }
}
