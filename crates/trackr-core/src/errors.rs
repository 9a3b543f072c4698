//! Error taxonomy shared by every trackr crate.
//!
//! [`CoreError`] carries the domain failures the engine reports to callers.
//! Infrastructure errors (`DatabaseError`, `NotifyError`) live in their own
//! crates and map onto the same [`ErrorKind`] so callers can branch on one
//! stable vocabulary.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable classification of an engine failure.
///
/// `NoOp` and `NoChange` mean "nothing happened"; `Conflict` and
/// `TransientInfra` mean "the attempt failed and may be retried".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    Conflict,
    NoOp,
    NoChange,
    AlreadyDeleted,
    TransientInfra,
}

impl ErrorKind {
    /// HTTP-style status code carried by result objects.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Validation | Self::NoOp | Self::NoChange => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::AlreadyDeleted => 410,
            Self::TransientInfra => 503,
        }
    }

    /// Only conflicts and infrastructure hiccups are worth retrying.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Conflict | Self::TransientInfra)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::NotFound => "not_found_error",
            Self::Forbidden => "forbidden_error",
            Self::Conflict => "conflict_error",
            Self::NoOp => "no_op_error",
            Self::NoChange => "no_change_error",
            Self::AlreadyDeleted => "already_deleted_error",
            Self::TransientInfra => "transient_infra_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain errors raised by the issue store and the assignment workflow.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or inconsistent input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity lookup returned no result (absent or soft-deleted).
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A membership or role precondition failed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Concurrency token mismatch, or the action is illegal for the current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The operation was requested but no state change applies.
    #[error("Nothing to do: {0}")]
    NoOp(String),

    /// An update patch carried no effective differences.
    #[error("No changes detected for {entity_type} {id}")]
    NoChange { entity_type: String, id: String },

    /// The entity was already soft-deleted.
    #[error("{entity_type} {id} is already deleted")]
    AlreadyDeleted { entity_type: String, id: String },

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    pub fn not_found(entity_type: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NoOp(_) => ErrorKind::NoOp,
            Self::NoChange { .. } => ErrorKind::NoChange,
            Self::AlreadyDeleted { .. } => ErrorKind::AlreadyDeleted,
            Self::Other(_) => ErrorKind::TransientInfra,
        }
    }
}
