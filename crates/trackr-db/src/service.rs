//! Service layer orchestrating store mutations, the audit ledger, and events.
//!
//! `TrackrService` wraps `TrackrDb` (raw database access) together with the
//! membership oracle, the user directory, and the event sink. All repo and
//! workflow methods are implemented as `impl TrackrService` blocks.

use std::sync::Arc;

use trackr_config::GeneralConfig;
use trackr_core::events::{EventSink, IssueEvent};

use crate::TrackrDb;
use crate::error::{DatabaseError, conflict};
use crate::oracle::{MembershipOracle, SqlDirectory, UserDirectory};

/// Orchestrates mutations with audit entries and post-commit events.
///
/// Every mutation method follows this protocol:
/// 1. Read the current row and validate the request (no gate held)
/// 2. Consult the membership oracle if the change needs it
/// 3. Acquire the write gate and begin a transaction
/// 4. Conditional UPDATE guarded by the observed `version`
/// 5. Append audit entries inside the same transaction
/// 6. Commit, then publish domain events
pub struct TrackrService {
    db: TrackrDb,
    oracle: Arc<dyn MembershipOracle>,
    directory: Arc<dyn UserDirectory>,
    events: Arc<dyn EventSink>,
    limits: GeneralConfig,
}

impl TrackrService {
    /// Create a service over a local database, resolving membership and
    /// contacts from the same database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(
        db_path: &str,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, DatabaseError> {
        let db = TrackrDb::open_local(db_path).await?;
        Ok(Self::from_db(db, events))
    }

    /// Create from an existing `TrackrDb`.
    #[must_use]
    pub fn from_db(db: TrackrDb, events: Arc<dyn EventSink>) -> Self {
        let directory = Arc::new(SqlDirectory::new(db.reader()));
        Self {
            db,
            oracle: directory.clone(),
            directory,
            events,
            limits: GeneralConfig::default(),
        }
    }

    /// Replace the membership oracle.
    #[must_use]
    pub fn with_oracle(mut self, oracle: Arc<dyn MembershipOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    /// Replace the user directory.
    #[must_use]
    pub fn with_directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = directory;
        self
    }

    /// Apply listing limits from configuration.
    #[must_use]
    pub fn with_limits(mut self, limits: GeneralConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &TrackrDb {
        &self.db
    }

    pub(crate) fn oracle(&self) -> &dyn MembershipOracle {
        self.oracle.as_ref()
    }

    pub(crate) fn directory(&self) -> &dyn UserDirectory {
        self.directory.as_ref()
    }

    pub(crate) const fn limits(&self) -> &GeneralConfig {
        &self.limits
    }

    /// Hand a committed change to the event sink. Failures are logged only.
    pub(crate) fn publish(&self, event: IssueEvent) {
        let kind = event.kind();
        let issue_key = event.issue().key.clone();
        match self.events.publish(event) {
            Ok(()) => tracing::debug!(kind, issue_key, "published issue event"),
            Err(error) => {
                tracing::warn!(%error, kind, issue_key, "event sink rejected committed change");
            }
        }
    }
}

/// Reject a stale caller-supplied concurrency token before any write.
pub(crate) fn check_expected_version(
    key: &str,
    current: i64,
    expected: Option<i64>,
) -> Result<(), DatabaseError> {
    match expected {
        Some(expected) if expected != current => Err(conflict(format!(
            "Issue {key} is at version {current}, expected {expected}; reload and retry"
        ))),
        _ => Ok(()),
    }
}

/// The conditional write matched no row: someone else got there first.
pub(crate) fn stale_write(key: &str) -> DatabaseError {
    conflict(format!(
        "Issue {key} was modified concurrently; reload and retry"
    ))
}
