//! Error types for trackr-notify.

use thiserror::Error;
use trackr_core::errors::{CoreError, ErrorKind};

/// Failure reported by a mail transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Worth another attempt (timeouts, throttling, connection resets).
    #[error("transient transport failure: {0}")]
    Transient(String),

    /// The transport refused the message outright.
    #[error("message rejected: {0}")]
    Rejected(String),
}

impl TransportError {
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Errors from the dispatcher itself.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The dispatcher has been shut down and accepts no more jobs.
    #[error("notification dispatcher is shut down")]
    Closed,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl NotifyError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Closed | Self::Transport(_) => ErrorKind::TransientInfra,
        }
    }
}

impl From<NotifyError> for CoreError {
    fn from(err: NotifyError) -> Self {
        Self::Other(anyhow::Error::new(err))
    }
}
