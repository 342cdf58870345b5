//! Error types for anafora.

use thiserror::Error;

/// Result type for anafora operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for anafora operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error from the annotation model.
    #[error(transparent)]
    Core(#[from] anafora_core::Error),
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }
}
