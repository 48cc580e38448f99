//! Error types for store operations

use noticeboard_types::{FieldError, TypesError};
use thiserror::Error;

/// A filter expression was rejected; nothing was applied
#[derive(Debug, Clone, Error, PartialEq)]
#[error("malformed filter: {} clause error(s)", .errors.len())]
pub struct FilterError {
    pub errors: Vec<FieldError>,
}

/// Store errors, one variant per outcome a caller must tell apart
#[derive(Debug, Error)]
pub enum StoreError {
    /// The target is missing, soft-deleted or not owned by the caller
    #[error("message not found")]
    NotFound,

    /// A write was attempted but did not complete; safe to retry
    #[error("mutation failed: {0}")]
    MutationFailed(String),

    /// The pool or the query itself failed
    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    /// A stored row could not be mapped back into a message
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Classify an error raised by a create/update write
    ///
    /// Connectivity problems stay `Unavailable`; anything the database itself
    /// refused becomes `MutationFailed`.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_) => StoreError::Unavailable(err),
            other => StoreError::MutationFailed(other.to_string()),
        }
    }
}

impl From<TypesError> for StoreError {
    fn from(err: TypesError) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, StoreError>;
