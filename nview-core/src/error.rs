//! Error types for nview-core
//!
//! Provides a unified error type for every stage of the pipeline, from
//! argument validation through XML parsing to CSV serialization.

use std::path::PathBuf;

/// Result type alias for nview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for nview operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Command line is missing something required (reported with usage text)
    #[error("{0}")]
    Usage(String),

    /// One or more requested columns do not exist
    #[error("Invalid columns: {}", .0.join(","))]
    InvalidColumns(Vec<String>),

    /// An option value failed validation
    #[error("{0}")]
    InvalidOption(String),

    /// One or more scan files do not exist
    #[error("No such file: {}", join_paths(.0))]
    FileNotFound(Vec<PathBuf>),

    /// A scan file could not be parsed
    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// An extracted (port, protocol) pair has no matching service on its host
    #[error("No service found for {port}/{protocol} on host {address}")]
    ServiceResolution {
        address: String,
        port: u16,
        protocol: String,
    },

    /// The filter expression is malformed or references unknown columns
    #[error("Invalid filter expression: {0}")]
    Filter(String),

    /// CSV serialization error
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Builds a parse error for `path` from anything displayable
    pub fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
