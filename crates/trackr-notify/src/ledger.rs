//! Per-key bookkeeping for notification jobs.
//!
//! A record lives while its job is pending and is dropped on delivery, so
//! the same key can be enqueued again afterwards. Failed records are kept
//! (up to [`FAILED_RETENTION`] of them) and keep blocking their key until
//! evicted.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::job::{EnqueueOutcome, JobRecord, JobState, NotificationJob};

/// Number of failed records kept for inspection.
pub const FAILED_RETENTION: usize = 50;

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<String, JobRecord>,
    failed: VecDeque<String>,
}

#[derive(Debug, Default)]
pub struct JobLedger {
    inner: Mutex<Inner>,
}

impl JobLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim `job.key` for a new pending job.
    pub fn try_register(&self, job: &NotificationJob) -> EnqueueOutcome {
        let mut inner = self.lock();
        if inner.records.contains_key(&job.key) {
            return EnqueueOutcome::Duplicate;
        }
        let now = Utc::now();
        inner.records.insert(
            job.key.clone(),
            JobRecord {
                key: job.key.clone(),
                to: job.message.to.clone(),
                subject: job.message.subject.clone(),
                state: JobState::Pending,
                attempts: 0,
                last_error: None,
                enqueued_at: now,
                updated_at: now,
            },
        );
        EnqueueOutcome::Enqueued
    }

    /// Drop a pending claim that never made it onto the queue.
    pub fn forget(&self, key: &str) {
        self.remove_pending(key);
    }

    pub fn record_retry(&self, key: &str, attempts: u32, error: &str) {
        self.update(key, |record| {
            record.attempts = attempts;
            record.last_error = Some(error.to_string());
        });
    }

    /// Release the key of a delivered job.
    pub fn mark_delivered(&self, key: &str) {
        self.remove_pending(key);
    }

    pub fn mark_failed(&self, key: &str, attempts: u32, error: &str) {
        let mut inner = self.lock();
        let Some(record) = inner.records.get_mut(key) else {
            return;
        };
        record.state = JobState::Failed;
        record.attempts = attempts;
        record.last_error = Some(error.to_string());
        record.updated_at = Utc::now();

        inner.failed.push_back(key.to_string());
        while inner.failed.len() > FAILED_RETENTION {
            if let Some(evicted) = inner.failed.pop_front() {
                inner.records.remove(&evicted);
            }
        }
    }

    #[must_use]
    pub fn job(&self, key: &str) -> Option<JobRecord> {
        self.lock().records.get(key).cloned()
    }

    /// All known records, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<JobRecord> {
        let mut records: Vec<JobRecord> = self.lock().records.values().cloned().collect();
        records.sort_by(|a, b| a.enqueued_at.cmp(&b.enqueued_at).then(a.key.cmp(&b.key)));
        records
    }

    fn remove_pending(&self, key: &str) {
        let mut inner = self.lock();
        if inner
            .records
            .get(key)
            .is_some_and(|r| r.state == JobState::Pending)
        {
            inner.records.remove(key);
        }
    }

    fn update(&self, key: &str, apply: impl FnOnce(&mut JobRecord)) {
        let mut inner = self.lock();
        if let Some(record) = inner.records.get_mut(key) {
            apply(record);
            record.updated_at = Utc::now();
        }
    }
}
