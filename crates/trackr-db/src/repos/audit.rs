//! Audit ledger: the append-only per-issue history.
//!
//! Entries are only ever written inside the transaction that makes the change
//! they describe. The `issue_history` table rejects UPDATE and DELETE.

use chrono::{DateTime, Utc};
use serde_json::Value;
use trackr_core::entities::AuditEntry;
use trackr_core::enums::AuditAction;
use trackr_core::ids::PREFIX_AUDIT;
use trackr_core::responses::ApiResponse;

use crate::error::{DatabaseError, not_found};
use crate::helpers::{
    fmt_datetime, get_opt_string, json_param, parse_datetime, parse_enum, parse_json_value,
};
use crate::service::TrackrService;

const SELECT_COLS: &str =
    "seq, id, issue_id, action, field, from_value, to_value, actor_id, reason, created_at";

/// An entry about to be appended; id, actor, and timestamp come from the
/// surrounding mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditDraft {
    pub action: AuditAction,
    pub field: &'static str,
    pub from: Value,
    pub to: Value,
    pub reason: Option<String>,
}

impl AuditDraft {
    #[must_use]
    pub const fn new(action: AuditAction, field: &'static str, from: Value, to: Value) -> Self {
        Self {
            action,
            field,
            from,
            to,
            reason: None,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }
}

/// Filter criteria for audit queries.
#[derive(Debug, Default)]
pub struct AuditFilter {
    pub issue_id: Option<String>,
    pub action: Option<AuditAction>,
    pub actor_id: Option<String>,
    pub limit: Option<u32>,
}

fn row_to_entry(row: &libsql::Row) -> Result<AuditEntry, DatabaseError> {
    Ok(AuditEntry {
        seq: row.get(0)?,
        id: row.get(1)?,
        issue_id: row.get(2)?,
        action: parse_enum(&row.get::<String>(3)?)?,
        field: row.get(4)?,
        from: parse_json_value(get_opt_string(row, 5)?.as_deref())?,
        to: parse_json_value(get_opt_string(row, 6)?.as_deref())?,
        actor_id: row.get(7)?,
        reason: get_opt_string(row, 8)?,
        created_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

impl TrackrService {
    /// Append one entry. Must be called with the mutation's open transaction.
    pub(crate) async fn append_audit(
        &self,
        tx: &libsql::Connection,
        issue_id: &str,
        actor_id: &str,
        at: &DateTime<Utc>,
        draft: &AuditDraft,
    ) -> Result<(), DatabaseError> {
        let id = self.db().generate_id(PREFIX_AUDIT).await?;
        tx.execute(
            "INSERT INTO issue_history (id, issue_id, action, field, from_value, to_value, actor_id, reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            libsql::params![
                id.as_str(),
                issue_id,
                draft.action.as_str(),
                draft.field,
                json_param(&draft.from),
                json_param(&draft.to),
                actor_id,
                draft.reason.as_deref(),
                fmt_datetime(at)
            ],
        )
        .await?;
        Ok(())
    }

    /// Full history of an issue, oldest first.
    ///
    /// Soft-deleted issues keep their history readable.
    ///
    /// # Errors
    ///
    /// Returns a not-found error only if the issue never existed.
    pub async fn get_issue_history(
        &self,
        issue_id: &str,
    ) -> Result<ApiResponse<Vec<AuditEntry>>, DatabaseError> {
        let issue = self
            .find_issue(issue_id, true)
            .await?
            .ok_or_else(|| not_found("issue", issue_id))?;

        let conn = self.db().read().await;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM issue_history
                     WHERE issue_id = ?1 ORDER BY created_at ASC, seq ASC"
                ),
                [issue.id.as_str()],
            )
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_entry(&row)?);
        }

        let message = format!("{} history entries for {}", entries.len(), issue.key);
        Ok(ApiResponse::ok(entries, message))
    }

    /// Query entries across issues, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref issue_id) = filter.issue_id {
            params.push(libsql::Value::Text(issue_id.clone()));
            conditions.push(format!("issue_id = ?{}", params.len()));
        }
        if let Some(ref action) = filter.action {
            params.push(libsql::Value::Text(action.as_str().to_string()));
            conditions.push(format!("action = ?{}", params.len()));
        }
        if let Some(ref actor_id) = filter.actor_id {
            params.push(libsql::Value::Text(actor_id.clone()));
            conditions.push(format!("actor_id = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(100);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM issue_history {where_clause}
             ORDER BY created_at DESC, seq DESC LIMIT {limit}"
        );

        let conn = self.db().read().await;
        let mut rows = conn
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_entry(&row)?);
        }
        Ok(entries)
    }
}
