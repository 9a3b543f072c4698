use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ProjectStatus;

/// A project owning a sequence of issues.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    /// Issue key prefix, e.g. `PROJ`.
    pub key: String,
    pub name: String,
    pub status: ProjectStatus,
    /// Last issue sequence number handed out.
    pub issue_seq: i64,
    pub created_at: DateTime<Utc>,
}
