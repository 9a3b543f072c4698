//! Notification jobs and their ledger records.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A rendered message ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// One delivery to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationJob {
    /// Deterministic idempotency key, e.g. `notify-assignee-<issue>-<user>`.
    pub key: String,
    pub recipient_id: String,
    pub message: OutgoingMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Queued, in flight, or waiting for a retry.
    Pending,
    /// Terminal: attempts exhausted or the transport rejected the message.
    Failed,
}

/// Bookkeeping entry for one idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    pub key: String,
    pub to: String,
    pub subject: String,
    pub state: JobState,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Enqueued,
    /// A live or retained job already holds this key.
    Duplicate,
}
