use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{IssueStatus, IssueType, Priority};

/// A tracked unit of work inside a project.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Issue {
    pub id: String,
    /// Human-readable key, `"<PROJECT_KEY>-<seq>"`.
    pub key: String,
    pub project_id: String,
    pub title: String,
    pub description: String,
    pub issue_type: IssueType,
    pub priority: Priority,
    /// Derived from `priority`, see [`Priority::order`].
    pub priority_order: i64,
    pub status: IssueStatus,
    pub reporter_id: String,
    pub assignee_id: Option<String>,
    /// Set iff `issue_type` is `subtask`.
    pub parent_id: Option<String>,
    pub estimate: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
    pub labels: Vec<String>,
    pub is_deleted: bool,
    pub deleted_by: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency token, incremented on every accepted mutation.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
