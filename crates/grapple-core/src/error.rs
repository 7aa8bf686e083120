//! Error types shared by every grapple crate.

use thiserror::Error;

/// Error type for graph construction, estimator fitting and I/O.
#[derive(Error, Debug)]
pub enum Error {
    /// The graph violates a structural requirement (empty, self-loop, ...).
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// An estimator or walker configuration value is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Row/column counts disagree (e.g. feature rows vs. node count).
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A query was made before `fit`.
    #[error("{0} has not been fitted")]
    NotFitted(&'static str),

    /// A token was requested from a skip-gram model that never learned it.
    #[error("token not in vocabulary: {0}")]
    MissingToken(String),

    /// Malformed input file.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
