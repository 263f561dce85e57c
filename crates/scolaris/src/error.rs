//! Error types for the Scolaris library.
//!
//! Validation findings are not errors: they are returned as [`Violation`]
//! values. The variants here cover everything else, with [`Delivery`] and
//! [`Persistence`] kept separate so callers can distinguish "the worker
//! channel broke" and "a rule failed to save" from "the data has problems".
//!
//! [`Violation`]: crate::validation::Violation
//! [`Delivery`]: ImportError::Delivery
//! [`Persistence`]: ImportError::Persistence

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Scolaris operations.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to validate.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Invalid rule registry or session configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A referenced column does not exist in the table.
    #[error("Unknown column: '{0}'")]
    UnknownColumn(String),

    /// The worker channel failed to deliver a response. Distinct from a
    /// clean result with zero findings; callers should surface a retryable
    /// error state.
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// A local store read or write failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error in a format rule.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Result type alias for Scolaris operations.
pub type Result<T> = std::result::Result<T, ImportError>;
