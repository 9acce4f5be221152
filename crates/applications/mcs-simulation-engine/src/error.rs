//! Error types for the run store and parameter files

use std::path::PathBuf;
use thiserror::Error;

/// Persistence result type
pub type StoreResult<T> = std::result::Result<T, PersistenceError>;

/// Errors that can occur while reading or writing saved runs
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A row could not be parsed back into a record
    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// File is empty or its header does not list the expected columns
    #[error("{}: expected header '{expected}'", .path.display())]
    BadHeader { path: PathBuf, expected: String },

    /// No saved run with this identifier
    #[error("Run {0} not found")]
    RunNotFound(String),
}

impl PersistenceError {
    /// Create a parse error for a given file line (1-based)
    pub fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}
