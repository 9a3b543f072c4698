//! Background delivery of notification jobs.
//!
//! One supervisor task reads the queue and spawns a task per job into a
//! `JoinSet`. Each attempt holds a semaphore permit, so at most
//! `notify.workers` sends are in flight; the permit is released while a job
//! waits out its backoff.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use trackr_config::NotifyConfig;
use trackr_core::errors::CoreError;
use trackr_core::events::{EventSink, IssueEvent};

use crate::error::NotifyError;
use crate::job::{EnqueueOutcome, JobRecord, NotificationJob};
use crate::ledger::JobLedger;
use crate::retry::RetryPolicy;
use crate::templates;
use crate::transport::MailTransport;

struct Shared {
    transport: Arc<dyn MailTransport>,
    ledger: JobLedger,
    policy: RetryPolicy,
    permits: Semaphore,
}

/// Queue-backed notification dispatcher.
///
/// Must be started from within a Tokio runtime.
pub struct Dispatcher {
    shared: Arc<Shared>,
    from_address: String,
    sender: Mutex<Option<mpsc::UnboundedSender<NotificationJob>>>,
    supervisor: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Spawn the supervisor and return a handle that accepts jobs.
    #[must_use]
    pub fn start(config: &NotifyConfig, transport: Arc<dyn MailTransport>) -> Self {
        let shared = Arc::new(Shared {
            transport,
            ledger: JobLedger::new(),
            policy: RetryPolicy::from_config(config),
            permits: Semaphore::new(config.workers.max(1)),
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(supervise(Arc::clone(&shared), rx));
        tracing::debug!(workers = config.workers, "notification dispatcher started");

        Self {
            shared,
            from_address: config.from_address.clone(),
            sender: Mutex::new(Some(tx)),
            supervisor: tokio::sync::Mutex::new(Some(handle)),
        }
    }

    /// Queue a job unless its key is already pending or retained as failed.
    ///
    /// Never waits for delivery.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Closed` after [`Self::shutdown`].
    pub fn enqueue(&self, job: NotificationJob) -> Result<EnqueueOutcome, NotifyError> {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = sender.as_ref() else {
            return Err(NotifyError::Closed);
        };

        if self.shared.ledger.try_register(&job) == EnqueueOutcome::Duplicate {
            tracing::debug!(idempotency_key = %job.key, "duplicate notification skipped");
            return Ok(EnqueueOutcome::Duplicate);
        }

        let key = job.key.clone();
        if sender.send(job).is_err() {
            self.shared.ledger.forget(&key);
            return Err(NotifyError::Closed);
        }
        Ok(EnqueueOutcome::Enqueued)
    }

    /// Current record for an idempotency key.
    #[must_use]
    pub fn job(&self, key: &str) -> Option<JobRecord> {
        self.shared.ledger.job(key)
    }

    /// Every record the dispatcher still remembers.
    #[must_use]
    pub fn jobs(&self) -> Vec<JobRecord> {
        self.shared.ledger.snapshot()
    }

    /// Stop accepting jobs and wait for queued and in-flight ones to finish,
    /// retries included. Calling it again is a no-op.
    pub async fn shutdown(&self) {
        drop(
            self.sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        let handle = self.supervisor.lock().await.take();
        if let Some(handle) = handle {
            if let Err(error) = handle.await {
                tracing::error!(%error, "notification supervisor panicked");
            }
            tracing::debug!("notification dispatcher stopped");
        }
    }
}

impl EventSink for Dispatcher {
    /// Queue every notice the event renders to. A notice that cannot be
    /// queued is logged and does not stop the rest; the first such error is
    /// returned.
    fn publish(&self, event: IssueEvent) -> Result<(), CoreError> {
        let mut first_error = None;
        for notice in templates::render(&event) {
            let key = notice.key.clone();
            let user_id = notice.recipient.user_id.clone();
            let Some(job) = notice.into_job(&self.from_address) else {
                tracing::warn!(
                    idempotency_key = %key,
                    user_id = %user_id,
                    "recipient has no email address, notification skipped"
                );
                continue;
            };
            if let Err(error) = self.enqueue(job) {
                tracing::warn!(
                    idempotency_key = %key,
                    user_id = %user_id,
                    %error,
                    "notification could not be queued"
                );
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }
        first_error.map_or(Ok(()), |error| Err(error.into()))
    }
}

async fn supervise(shared: Arc<Shared>, mut rx: mpsc::UnboundedReceiver<NotificationJob>) {
    let mut tasks = JoinSet::new();
    while let Some(job) = rx.recv().await {
        tasks.spawn(deliver(Arc::clone(&shared), job));
        while let Some(result) = tasks.try_join_next() {
            log_join(result);
        }
    }
    while let Some(result) = tasks.join_next().await {
        log_join(result);
    }
}

fn log_join(result: Result<(), tokio::task::JoinError>) {
    if let Err(error) = result {
        tracing::error!(%error, "notification task panicked");
    }
}

async fn deliver(shared: Arc<Shared>, job: NotificationJob) {
    let mut attempt = 0_u32;
    loop {
        attempt += 1;
        let outcome = {
            let Ok(_permit) = shared.permits.acquire().await else {
                shared.ledger.mark_failed(&job.key, attempt - 1, "dispatcher closed");
                return;
            };
            shared.transport.send(&job.message).await
        };

        match outcome {
            Ok(()) => {
                shared.ledger.mark_delivered(&job.key);
                tracing::info!(
                    idempotency_key = %job.key,
                    to = %job.message.to,
                    attempt,
                    "notification delivered"
                );
                return;
            }
            Err(error) if error.is_retryable() && shared.policy.allows_retry_after(attempt) => {
                let delay = shared.policy.delay_before_retry(attempt);
                shared.ledger.record_retry(&job.key, attempt, &error.to_string());
                tracing::warn!(
                    idempotency_key = %job.key,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    %error,
                    "notification delivery failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => {
                shared.ledger.mark_failed(&job.key, attempt, &error.to_string());
                tracing::error!(
                    idempotency_key = %job.key,
                    to = %job.message.to,
                    attempt,
                    %error,
                    "notification delivery failed permanently"
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::job::{JobState, OutgoingMessage};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use trackr_core::enums::{IssueStatus, Priority};
    use trackr_core::events::{Contact, IssueSnapshot};

    /// Plays back scripted results, then succeeds.
    #[derive(Default)]
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<(), TransportError>>>,
        sent: Mutex<Vec<OutgoingMessage>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        hold: Option<Duration>,
    }

    impl ScriptedTransport {
        fn with_script(script: Vec<Result<(), TransportError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                ..Self::default()
            }
        }

        fn sent(&self) -> Vec<OutgoingMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MailTransport for ScriptedTransport {
        async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if let Some(hold) = self.hold {
                tokio::time::sleep(hold).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let next = self.script.lock().unwrap().pop_front().unwrap_or(Ok(()));
            self.sent.lock().unwrap().push(message.clone());
            next
        }
    }

    fn fast_config() -> NotifyConfig {
        NotifyConfig {
            workers: 2,
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
            from_address: "trackr@localhost".into(),
        }
    }

    fn job(key: &str) -> NotificationJob {
        NotificationJob {
            key: key.into(),
            recipient_id: "usr-alice000".into(),
            message: OutgoingMessage {
                from: "trackr@localhost".into(),
                to: "alice@example.com".into(),
                subject: "New Issue Assigned: Fix login".into(),
                html: "<p>hello</p>".into(),
            },
        }
    }

    fn reassigned(previous: Contact, next: Contact) -> IssueEvent {
        IssueEvent::Reassigned {
            issue: IssueSnapshot {
                id: "iss-0000aaaa".into(),
                key: "PROJ-1".into(),
                title: "Fix login".into(),
                description: String::new(),
                status: IssueStatus::InProgress,
                priority: Priority::Medium,
                project_name: "Payments".into(),
            },
            actor_id: "usr-lead0000".into(),
            previous,
            next,
            reason: None,
        }
    }

    fn transient() -> Result<(), TransportError> {
        Err(TransportError::Transient("connection reset".into()))
    }

    #[tokio::test]
    async fn delivers_queued_job() {
        let transport = Arc::new(ScriptedTransport::default());
        let dispatcher = Dispatcher::start(&fast_config(), transport.clone());

        assert_eq!(dispatcher.enqueue(job("k1")).unwrap(), EnqueueOutcome::Enqueued);
        dispatcher.shutdown().await;

        assert!(dispatcher.job("k1").is_none(), "delivered jobs are not retained");
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn delivered_jobs_do_not_accumulate() {
        let transport = Arc::new(ScriptedTransport::default());
        let dispatcher = Dispatcher::start(&fast_config(), transport.clone());

        for i in 0..200 {
            dispatcher.enqueue(job(&format!("k{i}"))).unwrap();
        }
        dispatcher.shutdown().await;

        assert_eq!(transport.sent().len(), 200);
        assert!(dispatcher.jobs().is_empty());
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let transport = Arc::new(ScriptedTransport::with_script(vec![transient(), transient()]));
        let dispatcher = Dispatcher::start(&fast_config(), transport.clone());

        dispatcher.enqueue(job("k1")).unwrap();
        dispatcher.shutdown().await;

        assert!(dispatcher.job("k1").is_none());
        assert_eq!(transport.sent().len(), 3);
    }

    #[tokio::test]
    async fn attempts_are_bounded() {
        let transport = Arc::new(ScriptedTransport::with_script(vec![
            transient(),
            transient(),
            transient(),
            transient(),
        ]));
        let dispatcher = Dispatcher::start(&fast_config(), transport.clone());

        dispatcher.enqueue(job("k1")).unwrap();
        dispatcher.shutdown().await;

        let record = dispatcher.job("k1").unwrap();
        assert_eq!(record.state, JobState::Failed);
        assert_eq!(record.attempts, 3);
        assert_eq!(transport.sent().len(), 3);
    }

    #[tokio::test]
    async fn rejected_message_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::with_script(vec![Err(
            TransportError::Rejected("mailbox unavailable".into()),
        )]));
        let dispatcher = Dispatcher::start(&fast_config(), transport.clone());

        dispatcher.enqueue(job("k1")).unwrap();
        dispatcher.shutdown().await;

        let record = dispatcher.job("k1").unwrap();
        assert_eq!(record.state, JobState::Failed);
        assert_eq!(record.attempts, 1);
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn pending_key_is_deduplicated() {
        let transport = Arc::new(ScriptedTransport::default());
        let dispatcher = Dispatcher::start(&fast_config(), transport.clone());

        assert_eq!(dispatcher.enqueue(job("k1")).unwrap(), EnqueueOutcome::Enqueued);
        assert_eq!(dispatcher.enqueue(job("k1")).unwrap(), EnqueueOutcome::Duplicate);
        dispatcher.shutdown().await;

        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn enqueue_after_shutdown_is_rejected() {
        let dispatcher = Dispatcher::start(&fast_config(), Arc::new(ScriptedTransport::default()));
        dispatcher.shutdown().await;
        dispatcher.shutdown().await;

        let err = dispatcher.enqueue(job("k1")).unwrap_err();
        assert!(matches!(err, NotifyError::Closed));
        assert!(dispatcher.job("k1").is_none());
    }

    #[tokio::test]
    async fn in_flight_sends_are_bounded_by_workers() {
        let transport = Arc::new(ScriptedTransport {
            hold: Some(Duration::from_millis(5)),
            ..ScriptedTransport::default()
        });
        let dispatcher = Dispatcher::start(&fast_config(), transport.clone());

        for i in 0..6 {
            dispatcher.enqueue(job(&format!("k{i}"))).unwrap();
        }
        dispatcher.shutdown().await;

        assert_eq!(transport.sent().len(), 6);
        assert!(transport.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn publish_skips_recipients_without_email() {
        let transport = Arc::new(ScriptedTransport::default());
        let dispatcher = Dispatcher::start(&fast_config(), transport.clone());

        dispatcher
            .publish(reassigned(
                Contact {
                    user_id: "usr-carol000".into(),
                    name: "Carol".into(),
                    email: None,
                },
                Contact {
                    user_id: "usr-bob00000".into(),
                    name: "Bob".into(),
                    email: Some("bob@example.com".into()),
                },
            ))
            .unwrap();
        dispatcher.shutdown().await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "bob@example.com");
        assert!(dispatcher.jobs().is_empty());
    }

    /// Counts WARN events on the current thread.
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn publish_tries_every_notice_before_reporting_failure() {
        use tracing_subscriber::layer::SubscriberExt;

        let dispatcher = Dispatcher::start(&fast_config(), Arc::new(ScriptedTransport::default()));
        dispatcher.shutdown().await;

        let event = reassigned(
            Contact {
                user_id: "usr-carol000".into(),
                name: "Carol".into(),
                email: Some("carol@example.com".into()),
            },
            Contact {
                user_id: "usr-bob00000".into(),
                name: "Bob".into(),
                email: Some("bob@example.com".into()),
            },
        );
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));
        let result = tracing::subscriber::with_default(subscriber, || dispatcher.publish(event));

        let err = result.unwrap_err();
        assert_eq!(err.kind(), trackr_core::errors::ErrorKind::TransientInfra);
        assert_eq!(warnings.load(Ordering::SeqCst), 2);
        assert!(dispatcher.jobs().is_empty());
    }
}
