//! Error types for anafora-core.

use thiserror::Error;

/// Result type for anafora-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for anafora-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An annotation with this id is already in the collection.
    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    /// A property points at an annotation that is not in the collection.
    #[error("Annotation {id:?} must be in the collection before it is assigned to property {property:?}")]
    UnknownReference {
        /// Property being assigned
        property: String,
        /// Id of the referenced annotation
        id: String,
    },

    /// No annotation with this id.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a duplicate id error.
    #[must_use]
    pub fn duplicate_id(id: impl Into<String>) -> Self {
        Self::DuplicateId(id.into())
    }

    /// Create an unknown reference error.
    #[must_use]
    pub fn unknown_reference(property: impl Into<String>, id: impl Into<String>) -> Self {
        Self::UnknownReference {
            property: property.into(),
            id: id.into(),
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }
}
