use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::AuditAction;

/// An immutable record of one accepted field change on an issue.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: String,
    /// Insertion order; breaks ties between entries written in the same transaction.
    pub seq: i64,
    pub issue_id: String,
    pub action: AuditAction,
    pub field: String,
    pub from: serde_json::Value,
    pub to: serde_json::Value,
    pub actor_id: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}
