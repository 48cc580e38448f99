use thiserror::Error;

/// Errors raised while constructing domain values from untrusted input
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("tenant id must not be empty")]
    EmptyTenant,

    #[error("tenant id '{0}' contains the ',' separator")]
    TenantSeparator(String),

    #[error("invalid message id '{0}': expected 32 lowercase hex characters")]
    InvalidMessageId(String),

    #[error("unknown message status {0}")]
    InvalidStatus(i64),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("unknown sort direction '{0}'")]
    UnknownDirection(String),
}
