//! Errors surfaced to the serving layer.
//!
//! Only three outcomes ever leave the query path: a validation failure, a
//! not-found, or a generic failure marker with no internal detail.

use thiserror::Error;

pub type QueryResult<T> = std::result::Result<T, QueryError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Malformed or out-of-range parameter. Never retried.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A defined outcome for unknown ids, not an exception
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error")]
    Internal,
}

impl QueryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
