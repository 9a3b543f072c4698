//! Mail transport seam.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::job::OutgoingMessage;

/// Something that can hand a rendered message to a mail system.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Attempt one delivery.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Transient` when a retry may succeed, or
    /// `TransportError::Rejected` when it never will.
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError>;
}

/// Transport that writes each message to the log instead of sending it.
#[derive(Debug, Default, Clone)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        tracing::info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            bytes = message.html.len(),
            "mail delivered to log"
        );
        Ok(())
    }
}
