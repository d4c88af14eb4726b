//! Error types for note store operations.

use thiserror::Error;

/// Failure of a note store operation.
///
/// `InvalidArgument` and `NotFound` are caller errors; `StorageUnavailable`
/// covers everything that goes wrong underneath. The store never retries.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request violates a field constraint.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No note with this id exists at the time of the operation.
    #[error("Note not found: {id}")]
    NotFound { id: String },

    /// The database could not be reached, failed a query, or returned rows
    /// that could not be read back.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl StoreError {
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::StorageUnavailable(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
