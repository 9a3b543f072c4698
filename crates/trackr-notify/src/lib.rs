//! # trackr-notify
//!
//! Asynchronous notification dispatch for committed assignment changes.
//!
//! The [`Dispatcher`] is constructed once at startup and handed to the issue
//! service as its `EventSink`. Publishing renders each event into one job
//! per recipient and enqueues it without waiting for delivery. A supervisor
//! task drains the queue, delivering through a [`MailTransport`] with a
//! bounded number of concurrent sends and exponential backoff on failure.
//!
//! Jobs carry deterministic idempotency keys. While a job is pending, or kept
//! as a failed record, enqueuing the same key again is a no-op.

pub mod dispatcher;
pub mod error;
pub mod job;
pub mod ledger;
pub mod retry;
pub mod templates;
pub mod transport;

pub use dispatcher::Dispatcher;
pub use error::{NotifyError, TransportError};
pub use job::{EnqueueOutcome, JobRecord, JobState, NotificationJob, OutgoingMessage};
pub use transport::{LogTransport, MailTransport};
