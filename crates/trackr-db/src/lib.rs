//! # trackr-db
//!
//! libSQL persistence for trackr: the issue store, the append-only audit
//! ledger, and the assignment workflow that ties them together.
//!
//! Uses the `libsql` crate (C `SQLite` fork, v0.9.29) in local mode over one
//! shared connection. A read/write gate guards that connection: mutations go
//! through [`TrackrDb::begin_write`], which holds the gate exclusively for the
//! whole transaction window, and reads go through [`TrackrDb::read`], which
//! holds it shared. Readers therefore never run inside someone else's open
//! transaction and only ever observe committed state. Optimistic concurrency
//! is enforced by the `version` column on `issues`.

pub mod error;
pub mod helpers;
mod migrations;
pub mod oracle;
pub mod repos;
pub mod service;
pub mod updates;
pub mod workflow;

#[cfg(test)]
mod test_support;

use std::ops::Deref;
use std::sync::Arc;

use error::DatabaseError;
use libsql::Builder;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Central database handle for all trackr state.
///
/// Wraps a libSQL database and connection. Provides ID generation, the
/// read gate, and the write gate used by every mutating operation.
pub struct TrackrDb {
    #[allow(dead_code)]
    db: libsql::Database,
    reader: DbReader,
}

impl TrackrDb {
    /// Open a local database at the given path, or `":memory:"` for tests.
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let trackr_db = Self {
            db,
            reader: DbReader {
                conn,
                gate: Arc::new(RwLock::new(())),
            },
        };
        trackr_db.run_migrations().await?;
        tracing::debug!(path, "opened trackr database");
        Ok(trackr_db)
    }

    /// The raw connection, bypassing the gate.
    ///
    /// Only for migrations and test setup; request paths use [`Self::read`]
    /// or [`Self::begin_write`].
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.reader.conn
    }

    /// A cloneable read handle sharing this database's connection and gate.
    #[must_use]
    pub fn reader(&self) -> DbReader {
        self.reader.clone()
    }

    /// Wait for any open write transaction to end, then hold the gate shared.
    ///
    /// Never call this while already holding a [`ReadConn`] or a [`WriteTx`]
    /// on the same task.
    pub async fn read(&self) -> ReadConn<'_> {
        self.reader.read().await
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"iss-a3f8b2c1"`.
    ///
    /// Touches no table, so it runs outside the gate and may be called from
    /// inside a write transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .reader
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }

    /// Acquire the gate exclusively and open a transaction.
    ///
    /// The gate is held until the returned [`WriteTx`] is committed, rolled
    /// back, or dropped.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if `BEGIN` fails.
    pub async fn begin_write(&self) -> Result<WriteTx<'_>, DatabaseError> {
        let gate = self.reader.gate.write().await;
        let tx = self.reader.conn.transaction().await?;
        Ok(WriteTx { tx, _gate: gate })
    }
}

/// Read access to a [`TrackrDb`] that outlives a borrow of it.
///
/// Used by collaborators such as [`oracle::SqlDirectory`] that are built
/// once and shared behind an `Arc`.
#[derive(Clone)]
pub struct DbReader {
    conn: libsql::Connection,
    gate: Arc<RwLock<()>>,
}

impl DbReader {
    /// See [`TrackrDb::read`].
    pub async fn read(&self) -> ReadConn<'_> {
        let gate = self.gate.read().await;
        ReadConn {
            conn: &self.conn,
            _gate: gate,
        }
    }
}

/// The connection, held under the shared side of the gate.
///
/// Keep it alive until the last row has been read.
pub struct ReadConn<'a> {
    conn: &'a libsql::Connection,
    _gate: RwLockReadGuard<'a, ()>,
}

impl Deref for ReadConn<'_> {
    type Target = libsql::Connection;

    fn deref(&self) -> &Self::Target {
        self.conn
    }
}

/// An open write transaction holding the write gate.
///
/// Derefs to [`libsql::Transaction`] (and through it to the connection), so
/// statements are issued with `tx.execute(...)` / `tx.query(...)`. End it with
/// [`WriteTx::finish`] so every path either commits or rolls back.
pub struct WriteTx<'a> {
    // Field order matters: the transaction must end before the gate opens.
    tx: libsql::Transaction,
    _gate: RwLockWriteGuard<'a, ()>,
}

impl WriteTx<'_> {
    /// # Errors
    ///
    /// Returns `DatabaseError` if `COMMIT` fails.
    pub async fn commit(self) -> Result<(), DatabaseError> {
        let Self { tx, _gate } = self;
        tx.commit().await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if `ROLLBACK` fails.
    pub async fn rollback(self) -> Result<(), DatabaseError> {
        let Self { tx, _gate } = self;
        tx.rollback().await?;
        Ok(())
    }

    /// Commit when `result` is `Ok`, roll back otherwise, and hand `result` back.
    ///
    /// A failed rollback is logged; the original error wins.
    ///
    /// # Errors
    ///
    /// Returns the error carried by `result`, or the commit failure.
    pub async fn finish<T>(self, result: Result<T, DatabaseError>) -> Result<T, DatabaseError> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback failed after {err}");
                }
                Err(err)
            }
        }
    }
}

impl Deref for WriteTx<'_> {
    type Target = libsql::Transaction;

    fn deref(&self) -> &Self::Target {
        &self.tx
    }
}
