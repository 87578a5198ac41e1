//! Error types for the channel registry
//!
//! `NotFound` and `Conflict` are ordinary outcomes the caller reports.
//! `Inconsistent` means an internal invariant broke and the owning process
//! should stop using the registry. `Persistence` failures are logged by the
//! registry and never roll back an in-memory change.

use thiserror::Error;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the channel registry
#[derive(Error, Debug)]
pub enum Error {
    /// Lookup miss when creation was not requested
    #[error("Channel not found: {0}")]
    NotFound(String),

    /// Target name is already taken by another channel
    #[error("Channel name conflict: {0}")]
    Conflict(String),

    /// An internal invariant was violated
    #[error("Registry inconsistent: {0}")]
    Inconsistent(String),

    /// Durable store read/write/remove failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Caller supplied an unusable argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a name conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an invariant violation error
    pub fn inconsistent(msg: impl Into<String>) -> Self {
        Self::Inconsistent(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error means the registry can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Inconsistent(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
