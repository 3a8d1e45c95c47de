//! Error types for gridwire-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gridwire
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Cell id is well-formed but outside the grid bounds
    #[error("Unknown cell: {0}")]
    UnknownCell(String),

    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid cell range format
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Grid options rejected by validation
    #[error("Invalid grid options: {0}")]
    InvalidOptions(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
