use thiserror::Error;

use crate::store::Collection;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Represents caller input that failed a precondition. Always
    /// raised before any store call is made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Represents a failed call to the collection store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Represents a request without a signed-in identity.
    #[error("Not signed in")]
    Unauthenticated,

    /// Represents a signed-in identity that may not administer courses.
    #[error("{email} is not an administrator")]
    Forbidden { email: String },
}

impl AdminError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AdminError::Store(StoreError::NotFound { .. }))
    }
}

/// A required field was missing or out of range.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: &'static str,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: &'static str) -> Self {
        ValidationError { field, reason }
    }

    pub fn missing(field: &'static str) -> Self {
        ValidationError::new(field, "must not be empty")
    }
}

/// Enumerates errors returned by the collection store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed document does not exist.
    #[error("No document {id} in {collection}")]
    NotFound { collection: Collection, id: String },

    /// A stored document has a field of the wrong type.
    #[error("Malformed field {field} in document {id} of {collection}")]
    MalformedDocument {
        collection: Collection,
        id: String,
        field: &'static str,
    },

    /// Represents an SQL error.
    #[error("SQLx error")]
    Sqlx { source: sqlx::Error },

    /// The store could not be reached.
    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(source: sqlx::Error) -> Self {
        StoreError::Sqlx { source }
    }
}
