//! Error types for campus-planner persistence.

use thiserror::Error;

/// Errors raised while writing to (or reading from) the durable store.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The backend refused the write, e.g. because it is full.
    #[error("storage rejected write to '{key}': {reason}")]
    Rejected {
        /// Key being written.
        key: String,
        /// Backend explanation.
        reason: String,
    },

    /// Failed to serialize state to JSON.
    #[error("failed to serialize '{key}': {source}")]
    Serialize {
        /// Key being written.
        key: String,
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other unclassified error.
    #[error("Other error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for PersistenceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(format!("{err:#}"))
    }
}

/// Errors raised while reading an import artifact.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The artifact is not JSON at all.
    #[error("import file is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The top-level value is not an array.
    #[error("import file must contain a JSON array of tasks")]
    NotAnArray,

    /// Every record was malformed.
    #[error("no valid tasks found in import file")]
    NoValidTasks,
}
