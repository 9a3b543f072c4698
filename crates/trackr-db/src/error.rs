//! Database error types for trackr-db.

use thiserror::Error;
use trackr_core::errors::{CoreError, ErrorKind};

/// Errors from store and workflow operations.
///
/// Domain failures travel as [`DatabaseError::Core`]; everything else is an
/// infrastructure fault and classifies as [`ErrorKind::TransientInfra`].
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(err) => err.kind(),
            Self::Query(_)
            | Self::Migration(_)
            | Self::NoResult
            | Self::InvalidState(_)
            | Self::LibSql(_)
            | Self::Other(_) => ErrorKind::TransientInfra,
        }
    }

    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.kind().status_code()
    }
}

pub(crate) fn validation(msg: impl Into<String>) -> DatabaseError {
    CoreError::Validation(msg.into()).into()
}

pub(crate) fn conflict(msg: impl Into<String>) -> DatabaseError {
    CoreError::Conflict(msg.into()).into()
}

pub(crate) fn forbidden(msg: impl Into<String>) -> DatabaseError {
    CoreError::Forbidden(msg.into()).into()
}

pub(crate) fn not_found(entity_type: &str, id: &str) -> DatabaseError {
    CoreError::not_found(entity_type, id).into()
}
