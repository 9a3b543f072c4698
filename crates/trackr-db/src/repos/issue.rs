//! Issue repository: create, read, patch, soft delete, list.
//!
//! Assignment is not handled here; see [`crate::workflow`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use trackr_core::entities::{Issue, Project};
use trackr_core::enums::{AuditAction, IssueStatus, IssueType, Priority, SortField, SortOrder};
use trackr_core::errors::CoreError;
use trackr_core::ids::{PREFIX_ISSUE, issue_key};
use trackr_core::responses::{ApiResponse, DeleteReport, Page, PageInfo};

use crate::error::{DatabaseError, conflict, not_found, validation};
use crate::helpers::{
    fmt_datetime, get_opt_string, like_pattern, now, parse_datetime, parse_enum, parse_labels,
    parse_optional_datetime, to_stored_precision,
};
use crate::repos::audit::AuditDraft;
use crate::service::{TrackrService, check_expected_version, stale_write};
use crate::updates::issue::IssueUpdate;

pub(crate) const SELECT_COLS: &str = "id, key, project_id, title, description, type, priority, \
     priority_order, status, reporter_id, assignee_id, parent_id, estimate, due_date, labels, \
     is_deleted, deleted_by, deleted_at, version, created_at, updated_at";

pub(crate) fn row_to_issue(row: &libsql::Row) -> Result<Issue, DatabaseError> {
    Ok(Issue {
        id: row.get(0)?,
        key: row.get(1)?,
        project_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        issue_type: parse_enum(&row.get::<String>(5)?)?,
        priority: parse_enum(&row.get::<String>(6)?)?,
        priority_order: row.get(7)?,
        status: parse_enum(&row.get::<String>(8)?)?,
        reporter_id: row.get(9)?,
        assignee_id: get_opt_string(row, 10)?,
        parent_id: get_opt_string(row, 11)?,
        estimate: row.get::<Option<f64>>(12)?,
        due_date: parse_optional_datetime(get_opt_string(row, 13)?.as_deref())?,
        labels: parse_labels(&row.get::<String>(14)?)?,
        is_deleted: row.get::<i64>(15)? != 0,
        deleted_by: get_opt_string(row, 16)?,
        deleted_at: parse_optional_datetime(get_opt_string(row, 17)?.as_deref())?,
        version: row.get(18)?,
        created_at: parse_datetime(&row.get::<String>(19)?)?,
        updated_at: parse_datetime(&row.get::<String>(20)?)?,
    })
}

/// Input for [`TrackrService::create_issue`].
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    pub title: String,
    pub description: Option<String>,
    pub issue_type: IssueType,
    pub priority: Priority,
    pub status: IssueStatus,
    pub estimate: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
    pub labels: Vec<String>,
    pub parent_id: Option<String>,
}

impl NewIssue {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// A subtask under `parent_id`.
    #[must_use]
    pub fn subtask(title: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            issue_type: IssueType::Subtask,
            parent_id: Some(parent_id.into()),
            ..Self::new(title)
        }
    }
}

/// Listing filters. All present filters must match.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub priority: Option<Priority>,
    pub issue_type: Option<IssueType>,
    pub assignee_id: Option<String>,
    /// Matches issues carrying any of these labels.
    pub labels: Vec<String>,
    /// Case-insensitive substring of title, description, or key.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Pagination {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IssueSort {
    pub field: SortField,
    pub order: SortOrder,
}

/// Trim, drop blanks, dedupe, and sort.
fn normalize_labels(labels: &[String]) -> Vec<String> {
    labels
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn due_date_json(due: Option<&DateTime<Utc>>) -> Value {
    due.map_or(Value::Null, |d| Value::String(fmt_datetime(d)))
}

impl TrackrService {
    pub(crate) async fn find_issue(
        &self,
        id: &str,
        include_deleted: bool,
    ) -> Result<Option<Issue>, DatabaseError> {
        let deleted_clause = if include_deleted { "" } else { " AND is_deleted = 0" };
        let conn = self.db().read().await;
        let mut rows = conn
            .query(
                &format!("SELECT {SELECT_COLS} FROM issues WHERE id = ?1{deleted_clause}"),
                [id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_issue(&row)?)),
            None => Ok(None),
        }
    }

    /// A live issue, or not-found for both absent and soft-deleted ids.
    pub(crate) async fn require_issue(&self, id: &str) -> Result<Issue, DatabaseError> {
        self.find_issue(id, false)
            .await?
            .ok_or_else(|| not_found("issue", id))
    }

    /// Map an issue id or key (`PROJ-12`) to its id.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if nothing matches.
    pub async fn resolve_issue_id(&self, id_or_key: &str) -> Result<String, DatabaseError> {
        let needle = id_or_key.trim();
        let conn = self.db().read().await;
        let mut rows = conn
            .query(
                "SELECT id FROM issues WHERE id = ?1 OR key = upper(?1) LIMIT 1",
                [needle],
            )
            .await?;
        let row = rows.next().await?.ok_or_else(|| not_found("issue", needle))?;
        Ok(row.get::<String>(0)?)
    }

    /// Check the parent/subtask invariant for a new issue.
    async fn check_parent_link(
        &self,
        project: &Project,
        issue_type: IssueType,
        parent_id: Option<&str>,
    ) -> Result<Option<String>, DatabaseError> {
        let parent_id = parent_id.map(str::trim).filter(|p| !p.is_empty());
        match (issue_type.is_subtask(), parent_id) {
            (false, None) => Ok(None),
            (true, None) => Err(validation("A subtask requires a parent issue")),
            (false, Some(_)) => Err(validation("Only subtasks can have a parent issue")),
            (true, Some(parent_id)) => {
                let parent = self.require_issue(parent_id).await?;
                if parent.project_id != project.id {
                    return Err(validation(format!(
                        "Parent issue {} belongs to a different project",
                        parent.key
                    )));
                }
                if parent.issue_type.is_subtask() {
                    return Err(validation(format!(
                        "Subtask {} cannot be a parent issue",
                        parent.key
                    )));
                }
                Ok(Some(parent.id))
            }
        }
    }

    /// Create an issue and its `CREATE` history entry.
    ///
    /// # Errors
    ///
    /// Validation errors for bad input or a broken parent link, not-found for
    /// a missing project or parent.
    pub async fn create_issue(
        &self,
        actor_id: &str,
        project_id: &str,
        new: NewIssue,
    ) -> Result<ApiResponse<Issue>, DatabaseError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(validation("Title is required"));
        }
        if let Some(estimate) = new.estimate {
            if !estimate.is_finite() || estimate < 0.0 {
                return Err(validation("Estimate must be a non-negative number"));
            }
        }
        let now = now();
        let due_date = new.due_date.map(to_stored_precision);
        if due_date.is_some_and(|due| due < now) {
            return Err(validation("Due date cannot be in the past"));
        }
        let labels = normalize_labels(&new.labels);
        let description = new
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        let project = self.get_project(project_id).await?;
        let parent_id = self
            .check_parent_link(&project, new.issue_type, new.parent_id.as_deref())
            .await?;

        let id = self.db().generate_id(PREFIX_ISSUE).await?;
        let labels_json =
            serde_json::to_string(&labels).map_err(|e| DatabaseError::Other(e.into()))?;

        let tx = self.db().begin_write().await?;
        let result = async {
            if let Some(ref parent_id) = parent_id {
                let mut rows = tx
                    .query(
                        "SELECT 1 FROM issues WHERE id = ?1 AND is_deleted = 0",
                        [parent_id.as_str()],
                    )
                    .await?;
                if rows.next().await?.is_none() {
                    return Err(conflict(format!(
                        "Parent issue {parent_id} was deleted concurrently"
                    )));
                }
            }

            let seq = Self::next_issue_seq(&tx, &project.id).await?;
            let key = issue_key(&project.key, seq);
            tx.execute(
                "INSERT INTO issues (id, key, project_id, title, description, type, priority,
                     priority_order, status, reporter_id, parent_id, estimate, due_date, labels,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                libsql::params![
                    id.as_str(),
                    key.as_str(),
                    project.id.as_str(),
                    title,
                    description.as_str(),
                    new.issue_type.as_str(),
                    new.priority.as_str(),
                    new.priority.order(),
                    new.status.as_str(),
                    actor_id,
                    parent_id.as_deref(),
                    new.estimate,
                    due_date.as_ref().map(fmt_datetime),
                    labels_json.as_str(),
                    fmt_datetime(&now),
                    fmt_datetime(&now)
                ],
            )
            .await?;

            let draft = AuditDraft::new(
                AuditAction::Create,
                "issue",
                Value::Null,
                Value::String(key.clone()),
            );
            self.append_audit(&tx, &id, actor_id, &now, &draft).await?;
            Ok::<_, DatabaseError>(key)
        }
        .await;
        let key = tx.finish(result).await?;

        tracing::info!(issue_id = %id, key, project = %project.key, actor_id, "created issue");
        let issue = Issue {
            id,
            key,
            project_id: project.id,
            title: title.to_string(),
            description,
            issue_type: new.issue_type,
            priority: new.priority,
            priority_order: new.priority.order(),
            status: new.status,
            reporter_id: actor_id.to_string(),
            assignee_id: None,
            parent_id,
            estimate: new.estimate,
            due_date,
            labels,
            is_deleted: false,
            deleted_by: None,
            deleted_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        Ok(ApiResponse::created(issue, "Issue created successfully"))
    }

    /// # Errors
    ///
    /// Returns a not-found error for absent or soft-deleted issues.
    pub async fn get_issue(&self, issue_id: &str) -> Result<ApiResponse<Issue>, DatabaseError> {
        let issue = self.require_issue(issue_id).await?;
        Ok(ApiResponse::ok(issue, "Issue fetched successfully"))
    }

    /// Apply a patch to the updatable fields, one history entry per changed field.
    ///
    /// # Errors
    ///
    /// Not-found, validation, no-change when nothing differs, and conflict
    /// when the version moved underneath.
    pub async fn update_issue(
        &self,
        actor_id: &str,
        issue_id: &str,
        update: IssueUpdate,
        expected_version: Option<i64>,
    ) -> Result<ApiResponse<Issue>, DatabaseError> {
        let current = self.require_issue(issue_id).await?;
        check_expected_version(&current.key, current.version, expected_version)?;

        let now = now();
        let mut next = current.clone();
        let mut sets: Vec<(&'static str, libsql::Value)> = Vec::new();
        let mut drafts: Vec<AuditDraft> = Vec::new();

        if let Some(title) = update.title.as_deref().map(str::trim) {
            if title.is_empty() {
                return Err(validation("Title cannot be empty"));
            }
            if title != current.title {
                sets.push(("title", title.into()));
                drafts.push(AuditDraft::new(
                    AuditAction::Update,
                    "title",
                    json!(current.title),
                    json!(title),
                ));
                next.title = title.to_string();
            }
        }
        if let Some(description) = update.description.as_deref().map(str::trim) {
            if description != current.description {
                sets.push(("description", description.into()));
                drafts.push(AuditDraft::new(
                    AuditAction::Update,
                    "description",
                    json!(current.description),
                    json!(description),
                ));
                next.description = description.to_string();
            }
        }
        if let Some(status) = update.status {
            if status != current.status {
                sets.push(("status", status.as_str().into()));
                drafts.push(AuditDraft::new(
                    AuditAction::StatusChange,
                    "status",
                    json!(current.status),
                    json!(status),
                ));
                next.status = status;
            }
        }
        if let Some(priority) = update.priority {
            if priority != current.priority {
                sets.push(("priority", priority.as_str().into()));
                sets.push(("priority_order", priority.order().into()));
                drafts.push(AuditDraft::new(
                    AuditAction::PriorityChange,
                    "priority",
                    json!(current.priority),
                    json!(priority),
                ));
                next.priority = priority;
                next.priority_order = priority.order();
            }
        }
        if let Some(due_date) = update.due_date {
            let due_date = due_date.map(to_stored_precision);
            if due_date != current.due_date {
                if due_date.is_some_and(|due| due < now) {
                    return Err(validation("Due date cannot be in the past"));
                }
                sets.push((
                    "due_date",
                    due_date
                        .as_ref()
                        .map_or(libsql::Value::Null, |d| fmt_datetime(d).into()),
                ));
                drafts.push(AuditDraft::new(
                    AuditAction::Update,
                    "due_date",
                    due_date_json(current.due_date.as_ref()),
                    due_date_json(due_date.as_ref()),
                ));
                next.due_date = due_date;
            }
        }

        if drafts.is_empty() {
            return Err(CoreError::NoChange {
                entity_type: "issue".to_string(),
                id: current.id,
            }
            .into());
        }

        let mut params: Vec<libsql::Value> = Vec::new();
        let mut assignments = Vec::new();
        for (column, value) in sets {
            params.push(value);
            assignments.push(format!("{column} = ?{}", params.len()));
        }
        params.push(fmt_datetime(&now).into());
        assignments.push(format!("updated_at = ?{}", params.len()));
        params.push(current.id.as_str().into());
        let id_idx = params.len();
        params.push(current.version.into());
        let version_idx = params.len();
        let sql = format!(
            "UPDATE issues SET {}, version = version + 1
             WHERE id = ?{id_idx} AND version = ?{version_idx} AND is_deleted = 0",
            assignments.join(", ")
        );

        let tx = self.db().begin_write().await?;
        let result = async {
            let changed = tx.execute(&sql, libsql::params_from_iter(params)).await?;
            if changed == 0 {
                return Err(stale_write(&current.key));
            }
            for draft in &drafts {
                self.append_audit(&tx, &current.id, actor_id, &now, draft)
                    .await?;
            }
            Ok::<_, DatabaseError>(())
        }
        .await;
        tx.finish(result).await?;

        next.version = current.version + 1;
        next.updated_at = now;
        tracing::info!(
            issue_id = %next.id,
            key = %next.key,
            fields = drafts.len(),
            actor_id,
            "updated issue"
        );
        Ok(ApiResponse::ok(next, "Issue updated successfully"))
    }

    /// Flag one row deleted under its version guard and record it.
    async fn mark_deleted(
        &self,
        tx: &libsql::Connection,
        issue_id: &str,
        version: i64,
        actor_id: &str,
        at: &DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let changed = tx
            .execute(
                "UPDATE issues SET is_deleted = 1, deleted_by = ?1, deleted_at = ?2, updated_at = ?2,
                     version = version + 1
                 WHERE id = ?3 AND version = ?4 AND is_deleted = 0",
                libsql::params![actor_id, fmt_datetime(at), issue_id, version],
            )
            .await?;
        if changed == 0 {
            return Ok(false);
        }
        let draft = AuditDraft::new(AuditAction::Delete, "is_deleted", json!(false), json!(true));
        self.append_audit(tx, issue_id, actor_id, at, &draft).await?;
        Ok(true)
    }

    /// Soft-delete an issue. Deleting a non-subtask also deletes its live
    /// subtasks in the same transaction, with the same actor and timestamp.
    ///
    /// # Errors
    ///
    /// Not-found if the issue never existed, already-deleted if it is gone,
    /// conflict on a version mismatch.
    pub async fn soft_delete_issue(
        &self,
        actor_id: &str,
        issue_id: &str,
        expected_version: Option<i64>,
    ) -> Result<ApiResponse<DeleteReport>, DatabaseError> {
        let issue = self
            .find_issue(issue_id, true)
            .await?
            .ok_or_else(|| not_found("issue", issue_id))?;
        if issue.is_deleted {
            return Err(CoreError::AlreadyDeleted {
                entity_type: "issue".to_string(),
                id: issue.id,
            }
            .into());
        }
        check_expected_version(&issue.key, issue.version, expected_version)?;

        let now = now();
        let tx = self.db().begin_write().await?;
        let result = async {
            if !self
                .mark_deleted(&tx, &issue.id, issue.version, actor_id, &now)
                .await?
            {
                return Err(stale_write(&issue.key));
            }

            let mut cascaded = Vec::new();
            if issue.issue_type.is_subtask() {
                return Ok(cascaded);
            }
            let children = {
                let mut rows = tx
                    .query(
                        "SELECT id, version FROM issues
                         WHERE parent_id = ?1 AND is_deleted = 0 ORDER BY rowid",
                        [issue.id.as_str()],
                    )
                    .await?;
                let mut children = Vec::new();
                while let Some(row) = rows.next().await? {
                    children.push((row.get::<String>(0)?, row.get::<i64>(1)?));
                }
                children
            };
            for (child_id, version) in children {
                if !self
                    .mark_deleted(&tx, &child_id, version, actor_id, &now)
                    .await?
                {
                    return Err(stale_write(&child_id));
                }
                cascaded.push(child_id);
            }
            Ok::<_, DatabaseError>(cascaded)
        }
        .await;
        let cascaded = tx.finish(result).await?;

        tracing::info!(
            issue_id = %issue.id,
            key = %issue.key,
            cascaded = cascaded.len(),
            actor_id,
            "soft-deleted issue"
        );
        let report = DeleteReport {
            issue_id: issue.id,
            key: issue.key,
            cascaded,
            deleted_by: actor_id.to_string(),
            deleted_at: now,
        };
        Ok(ApiResponse::ok(report, "Issue deleted successfully"))
    }

    /// List live issues of a project.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the project does not exist.
    pub async fn list_issues(
        &self,
        project_id: &str,
        filter: &IssueFilter,
        pagination: Pagination,
        sort: IssueSort,
    ) -> Result<ApiResponse<Page<Issue>>, DatabaseError> {
        let project = self.get_project(project_id).await?;
        let limits = self.limits();
        let limit = pagination
            .limit
            .unwrap_or(limits.default_limit)
            .clamp(1, limits.max_limit);
        let page = pagination.page.unwrap_or(1).max(1);

        let mut conditions = vec!["project_id = ?1".to_string(), "is_deleted = 0".to_string()];
        let mut params: Vec<libsql::Value> = vec![project.id.as_str().into()];

        if let Some(status) = filter.status {
            params.push(status.as_str().into());
            conditions.push(format!("status = ?{}", params.len()));
        }
        if let Some(priority) = filter.priority {
            params.push(priority.as_str().into());
            conditions.push(format!("priority = ?{}", params.len()));
        }
        if let Some(issue_type) = filter.issue_type {
            params.push(issue_type.as_str().into());
            conditions.push(format!("type = ?{}", params.len()));
        }
        if let Some(ref assignee_id) = filter.assignee_id {
            params.push(assignee_id.as_str().into());
            conditions.push(format!("assignee_id = ?{}", params.len()));
        }
        let labels = normalize_labels(&filter.labels);
        if !labels.is_empty() {
            let mut placeholders = Vec::new();
            for label in labels {
                params.push(label.into());
                placeholders.push(format!("?{}", params.len()));
            }
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM json_each(issues.labels) WHERE json_each.value IN ({}))",
                placeholders.join(", ")
            ));
        }
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            params.push(like_pattern(term).into());
            let idx = params.len();
            conditions.push(format!(
                "(title LIKE ?{idx} ESCAPE '\\' OR description LIKE ?{idx} ESCAPE '\\' \
                 OR key LIKE ?{idx} ESCAPE '\\')"
            ));
        }
        let where_clause = conditions.join(" AND ");

        let conn = self.db().read().await;
        let total = {
            let mut rows = conn
                .query(
                    &format!("SELECT COUNT(*) FROM issues WHERE {where_clause}"),
                    libsql::params_from_iter(params.clone()),
                )
                .await?;
            let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
            u64::try_from(row.get::<i64>(0)?).unwrap_or(0)
        };

        let offset = u64::from(page - 1) * u64::from(limit);
        let direction = sort.order.as_sql();
        let sql = format!(
            "SELECT {SELECT_COLS} FROM issues WHERE {where_clause}
             ORDER BY {} {direction}, rowid {direction} LIMIT {limit} OFFSET {offset}",
            sort.field.column()
        );
        let mut rows = conn
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_issue(&row)?);
        }

        let page = Page {
            items,
            pagination: PageInfo::new(page, limit, total),
        };
        Ok(ApiResponse::ok(page, "Issues fetched successfully"))
    }

    /// Live subtasks of an issue, in creation order.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the parent is absent or deleted.
    pub async fn get_child_issues(
        &self,
        parent_id: &str,
    ) -> Result<ApiResponse<Vec<Issue>>, DatabaseError> {
        let parent = self.require_issue(parent_id).await?;
        let conn = self.db().read().await;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM issues
                     WHERE parent_id = ?1 AND is_deleted = 0 ORDER BY rowid"
                ),
                [parent.id.as_str()],
            )
            .await?;
        let mut children = Vec::new();
        while let Some(row) = rows.next().await? {
            children.push(row_to_issue(&row)?);
        }
        let message = format!("{} subtasks of {}", children.len(), parent.key);
        Ok(ApiResponse::ok(children, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::seeded_service;
    use crate::updates::issue::IssueUpdateBuilder;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use trackr_core::errors::ErrorKind;

    #[tokio::test]
    async fn create_assigns_sequential_keys() {
        let (svc, fx, _) = seeded_service().await;
        let first = svc
            .create_issue(&fx.reporter.id, &fx.project.id, NewIssue::new("First"))
            .await
            .unwrap();
        assert_eq!(first.status_code, 201);
        assert_eq!(first.message, "Issue created successfully");
        let second = svc
            .create_issue(&fx.reporter.id, &fx.project.id, NewIssue::new("Second"))
            .await
            .unwrap()
            .into_data();

        assert_eq!(first.data.key, "PROJ-1");
        assert_eq!(second.key, "PROJ-2");
        assert_eq!(first.data.version, 0);
        assert_eq!(first.data.reporter_id, fx.reporter.id);
    }

    #[tokio::test]
    async fn created_issue_matches_stored_row() {
        let (svc, fx, _) = seeded_service().await;
        let new = NewIssue {
            title: "  Checkout fails  ".into(),
            description: Some("  on Safari ".into()),
            priority: Priority::Urgent,
            estimate: Some(3.5),
            due_date: Some(Utc::now() + Duration::days(2)),
            labels: vec!["web".into(), " payments ".into(), "web".into(), String::new()],
            ..NewIssue::default()
        };
        let created = svc
            .create_issue(&fx.reporter.id, &fx.project.id, new)
            .await
            .unwrap()
            .into_data();

        assert_eq!(created.title, "Checkout fails");
        assert_eq!(created.description, "on Safari");
        assert_eq!(created.priority_order, 1);
        assert_eq!(created.labels, vec!["payments", "web"]);

        let fetched = svc.get_issue(&created.id).await.unwrap().into_data();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn deleted_keys_are_never_reused() {
        let (svc, fx, _) = seeded_service().await;
        let first = svc
            .create_issue(&fx.reporter.id, &fx.project.id, NewIssue::new("First"))
            .await
            .unwrap()
            .into_data();
        svc.soft_delete_issue(&fx.reporter.id, &first.id, None)
            .await
            .unwrap();
        let next = svc
            .create_issue(&fx.reporter.id, &fx.project.id, NewIssue::new("Next"))
            .await
            .unwrap()
            .into_data();
        assert_eq!(next.key, "PROJ-2");
    }

    #[rstest]
    #[case::blank_title(NewIssue::new("   "))]
    #[case::negative_estimate(NewIssue { estimate: Some(-1.0), ..NewIssue::new("T") })]
    #[case::nan_estimate(NewIssue { estimate: Some(f64::NAN), ..NewIssue::new("T") })]
    #[case::past_due(NewIssue { due_date: Some(Utc::now() - Duration::days(1)), ..NewIssue::new("T") })]
    #[case::subtask_without_parent(NewIssue { issue_type: IssueType::Subtask, ..NewIssue::new("T") })]
    #[tokio::test]
    async fn create_rejects_invalid_input(#[case] new: NewIssue) {
        let (svc, fx, _) = seeded_service().await;
        let err = svc
            .create_issue(&fx.reporter.id, &fx.project.id, new)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn parent_link_rules() {
        let (svc, fx, _) = seeded_service().await;
        let story = svc
            .create_issue(
                &fx.reporter.id,
                &fx.project.id,
                NewIssue {
                    issue_type: IssueType::Story,
                    ..NewIssue::new("Story")
                },
            )
            .await
            .unwrap()
            .into_data();

        let task_with_parent = NewIssue {
            parent_id: Some(story.id.clone()),
            ..NewIssue::new("Task")
        };
        let err = svc
            .create_issue(&fx.reporter.id, &fx.project.id, task_with_parent)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let sub = svc
            .create_issue(
                &fx.reporter.id,
                &fx.project.id,
                NewIssue::subtask("Sub", &story.id),
            )
            .await
            .unwrap()
            .into_data();
        assert_eq!(sub.parent_id.as_deref(), Some(story.id.as_str()));

        let err = svc
            .create_issue(
                &fx.reporter.id,
                &fx.project.id,
                NewIssue::subtask("Sub of sub", &sub.id),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = svc
            .create_issue(
                &fx.reporter.id,
                &fx.project.id,
                NewIssue::subtask("Orphan", "iss-00000000"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn parent_must_share_project() {
        let (svc, fx, _) = seeded_service().await;
        let other = svc.create_project("OTHER", "Other").await.unwrap();
        let foreign = svc
            .create_issue(&fx.reporter.id, &other.id, NewIssue::new("Elsewhere"))
            .await
            .unwrap()
            .into_data();
        let err = svc
            .create_issue(
                &fx.reporter.id,
                &fx.project.id,
                NewIssue::subtask("Sub", &foreign.id),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn update_writes_one_entry_per_field() {
        let (svc, fx, _) = seeded_service().await;
        let issue = svc
            .create_issue(&fx.reporter.id, &fx.project.id, NewIssue::new("Old"))
            .await
            .unwrap()
            .into_data();

        let update = IssueUpdateBuilder::new()
            .title("New")
            .status(IssueStatus::InProgress)
            .priority(Priority::High)
            .build();
        let updated = svc
            .update_issue(&fx.alice.id, &issue.id, update, Some(0))
            .await
            .unwrap()
            .into_data();
        assert_eq!(updated.version, 1);
        assert_eq!(updated.priority_order, 2);
        assert_eq!(
            svc.get_issue(&issue.id).await.unwrap().into_data(),
            updated
        );

        let history = svc.get_issue_history(&issue.id).await.unwrap().into_data();
        let actions: Vec<_> = history.iter().map(|e| (e.action, e.field.as_str())).collect();
        assert_eq!(
            actions,
            vec![
                (AuditAction::Create, "issue"),
                (AuditAction::Update, "title"),
                (AuditAction::StatusChange, "status"),
                (AuditAction::PriorityChange, "priority"),
            ]
        );
        assert_eq!(history[2].from, json!("todo"));
        assert_eq!(history[2].to, json!("in_progress"));
        assert!(history[1..].iter().all(|e| e.created_at == updated.updated_at));
    }

    #[tokio::test]
    async fn update_without_differences_is_no_change() {
        let (svc, fx, _) = seeded_service().await;
        let issue = svc
            .create_issue(&fx.reporter.id, &fx.project.id, NewIssue::new("Same"))
            .await
            .unwrap()
            .into_data();

        let update = IssueUpdateBuilder::new()
            .title(" Same ")
            .status(IssueStatus::Todo)
            .build();
        let err = svc
            .update_issue(&fx.reporter.id, &issue.id, update, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoChange);

        let unchanged = svc.get_issue(&issue.id).await.unwrap().into_data();
        assert_eq!(unchanged.version, 0);
        assert_eq!(
            svc.get_issue_history(&issue.id).await.unwrap().data.len(),
            1
        );
    }

    #[tokio::test]
    async fn update_rejects_stale_version() {
        let (svc, fx, _) = seeded_service().await;
        let issue = svc
            .create_issue(&fx.reporter.id, &fx.project.id, NewIssue::new("T"))
            .await
            .unwrap()
            .into_data();
        let update = IssueUpdateBuilder::new().title("T2").build();
        let err = svc
            .update_issue(&fx.reporter.id, &issue.id, update, Some(7))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn clearing_due_date_is_recorded() {
        let (svc, fx, _) = seeded_service().await;
        let issue = svc
            .create_issue(
                &fx.reporter.id,
                &fx.project.id,
                NewIssue {
                    due_date: Some(Utc::now() + Duration::days(5)),
                    ..NewIssue::new("T")
                },
            )
            .await
            .unwrap()
            .into_data();

        let updated = svc
            .update_issue(
                &fx.reporter.id,
                &issue.id,
                IssueUpdateBuilder::new().due_date(None).build(),
                None,
            )
            .await
            .unwrap()
            .into_data();
        assert!(updated.due_date.is_none());

        let history = svc.get_issue_history(&issue.id).await.unwrap().into_data();
        let last = history.last().unwrap();
        assert_eq!(last.field, "due_date");
        assert_eq!(last.to, Value::Null);
        assert!(last.from.is_string());
    }

    #[tokio::test]
    async fn soft_delete_cascades_to_subtasks() {
        let (svc, fx, _) = seeded_service().await;
        let story = svc
            .create_issue(&fx.reporter.id, &fx.project.id, NewIssue::new("Story"))
            .await
            .unwrap()
            .into_data();
        let a = svc
            .create_issue(&fx.reporter.id, &fx.project.id, NewIssue::subtask("A", &story.id))
            .await
            .unwrap()
            .into_data();
        let b = svc
            .create_issue(&fx.reporter.id, &fx.project.id, NewIssue::subtask("B", &story.id))
            .await
            .unwrap()
            .into_data();

        let report = svc
            .soft_delete_issue(&fx.alice.id, &story.id, None)
            .await
            .unwrap();
        assert_eq!(report.message, "Issue deleted successfully");
        assert_eq!(report.data.cascaded, vec![a.id.clone(), b.id.clone()]);

        for id in [&story.id, &a.id, &b.id] {
            let err = svc.get_issue(id).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);

            let row = svc.find_issue(id, true).await.unwrap().unwrap();
            assert!(row.is_deleted);
            assert_eq!(row.deleted_by.as_deref(), Some(fx.alice.id.as_str()));
            assert_eq!(row.deleted_at, Some(report.data.deleted_at));
            assert_eq!(row.version, 1);

            let history = svc.get_issue_history(id).await.unwrap().into_data();
            assert_eq!(history.last().unwrap().action, AuditAction::Delete);
        }

        let err = svc
            .soft_delete_issue(&fx.alice.id, &story.id, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyDeleted);
    }

    #[tokio::test]
    async fn deleting_subtask_leaves_parent_alone() {
        let (svc, fx, _) = seeded_service().await;
        let story = svc
            .create_issue(&fx.reporter.id, &fx.project.id, NewIssue::new("Story"))
            .await
            .unwrap()
            .into_data();
        let sub = svc
            .create_issue(&fx.reporter.id, &fx.project.id, NewIssue::subtask("Sub", &story.id))
            .await
            .unwrap()
            .into_data();

        let report = svc
            .soft_delete_issue(&fx.reporter.id, &sub.id, None)
            .await
            .unwrap()
            .into_data();
        assert!(report.cascaded.is_empty());
        assert!(svc.get_issue(&story.id).await.is_ok());
        assert!(
            svc.get_child_issues(&story.id)
                .await
                .unwrap()
                .data
                .is_empty()
        );
    }

    #[tokio::test]
    async fn delete_unknown_issue_not_found() {
        let (svc, fx, _) = seeded_service().await;
        let err = svc
            .soft_delete_issue(&fx.reporter.id, "iss-00000000", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    async fn seed_listing(svc: &TrackrService, project_id: &str, reporter: &str) -> Vec<Issue> {
        let specs = [
            ("Login bug", IssueType::Bug, Priority::High, vec!["auth"]),
            ("Signup flow", IssueType::Story, Priority::Low, vec!["auth", "web"]),
            ("Refactor billing", IssueType::Task, Priority::Urgent, vec!["billing"]),
            ("Docs 100% coverage", IssueType::Task, Priority::Medium, vec![]),
        ];
        let mut issues = Vec::new();
        for (title, issue_type, priority, labels) in specs {
            let new = NewIssue {
                issue_type,
                priority,
                labels: labels.into_iter().map(String::from).collect(),
                ..NewIssue::new(title)
            };
            issues.push(
                svc.create_issue(reporter, project_id, new)
                    .await
                    .unwrap()
                    .into_data(),
            );
        }
        issues
    }

    #[tokio::test]
    async fn list_defaults_newest_first() {
        let (svc, fx, _) = seeded_service().await;
        let issues = seed_listing(&svc, &fx.project.id, &fx.reporter.id).await;

        let page = svc
            .list_issues(
                &fx.project.id,
                &IssueFilter::default(),
                Pagination::default(),
                IssueSort::default(),
            )
            .await
            .unwrap()
            .into_data();
        let keys: Vec<_> = page.items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["PROJ-4", "PROJ-3", "PROJ-2", "PROJ-1"]);
        assert_eq!(page.pagination.total_items, issues.len() as u64);
        assert_eq!(page.pagination.limit, 10);
        assert!(!page.pagination.has_next_page);
    }

    #[tokio::test]
    async fn list_filters_and_search() {
        let (svc, fx, _) = seeded_service().await;
        seed_listing(&svc, &fx.project.id, &fx.reporter.id).await;

        let list = |filter: IssueFilter| {
            let svc = &svc;
            let project_id = fx.project.id.clone();
            async move {
                svc.list_issues(&project_id, &filter, Pagination::default(), IssueSort::default())
                    .await
                    .unwrap()
                    .into_data()
                    .items
                    .into_iter()
                    .map(|i| i.title)
                    .collect::<Vec<_>>()
            }
        };

        assert_eq!(
            list(IssueFilter {
                labels: vec!["auth".into()],
                ..IssueFilter::default()
            })
            .await,
            vec!["Signup flow", "Login bug"]
        );
        assert_eq!(
            list(IssueFilter {
                search: Some("LOGIN".into()),
                ..IssueFilter::default()
            })
            .await,
            vec!["Login bug"]
        );
        assert_eq!(
            list(IssueFilter {
                search: Some("100%".into()),
                ..IssueFilter::default()
            })
            .await,
            vec!["Docs 100% coverage"]
        );
        assert_eq!(
            list(IssueFilter {
                search: Some("proj-3".into()),
                ..IssueFilter::default()
            })
            .await,
            vec!["Refactor billing"]
        );
        assert_eq!(
            list(IssueFilter {
                issue_type: Some(IssueType::Task),
                priority: Some(Priority::Urgent),
                ..IssueFilter::default()
            })
            .await,
            vec!["Refactor billing"]
        );
    }

    #[tokio::test]
    async fn list_sorts_by_priority_and_paginates() {
        let (svc, fx, _) = seeded_service().await;
        seed_listing(&svc, &fx.project.id, &fx.reporter.id).await;

        let sort = IssueSort {
            field: SortField::PriorityOrder,
            order: SortOrder::Asc,
        };
        let first = svc
            .list_issues(
                &fx.project.id,
                &IssueFilter::default(),
                Pagination {
                    page: Some(1),
                    limit: Some(3),
                },
                sort,
            )
            .await
            .unwrap()
            .into_data();
        let priorities: Vec<_> = first.items.iter().map(|i| i.priority).collect();
        assert_eq!(
            priorities,
            vec![Priority::Urgent, Priority::High, Priority::Medium]
        );
        assert_eq!(first.pagination.total_pages, 2);
        assert!(first.pagination.has_next_page);

        let second = svc
            .list_issues(
                &fx.project.id,
                &IssueFilter::default(),
                Pagination {
                    page: Some(2),
                    limit: Some(3),
                },
                sort,
            )
            .await
            .unwrap()
            .into_data();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].priority, Priority::Low);
        assert!(second.pagination.has_prev_page);
    }

    #[tokio::test]
    async fn list_clamps_limit_and_hides_deleted() {
        let (svc, fx, _) = seeded_service().await;
        let issues = seed_listing(&svc, &fx.project.id, &fx.reporter.id).await;
        svc.soft_delete_issue(&fx.reporter.id, &issues[0].id, None)
            .await
            .unwrap();

        let page = svc
            .list_issues(
                &fx.project.id,
                &IssueFilter::default(),
                Pagination {
                    page: Some(0),
                    limit: Some(10_000),
                },
                IssueSort::default(),
            )
            .await
            .unwrap()
            .into_data();
        assert_eq!(page.pagination.limit, 100);
        assert_eq!(page.pagination.current_page, 1);
        assert_eq!(page.items.len(), 3);
        assert!(page.items.iter().all(|i| i.id != issues[0].id));
    }

    #[tokio::test]
    async fn resolve_issue_by_key() {
        let (svc, fx, _) = seeded_service().await;
        let issue = svc
            .create_issue(&fx.reporter.id, &fx.project.id, NewIssue::new("T"))
            .await
            .unwrap()
            .into_data();
        assert_eq!(svc.resolve_issue_id("proj-1").await.unwrap(), issue.id);
        assert_eq!(svc.resolve_issue_id(&issue.id).await.unwrap(), issue.id);
        assert_eq!(
            svc.resolve_issue_id("PROJ-99").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
