//! Domain events emitted by the assignment workflow after commit.
//!
//! The workflow never talks to the notification layer directly. Once a
//! transaction commits it builds an [`IssueEvent`] and hands it to an
//! [`EventSink`]. Whatever the sink does with it (queue, log, drop) cannot
//! affect the committed state.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::Issue;
use crate::enums::{IssueStatus, Priority};
use crate::errors::CoreError;

/// How to reach a user.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Contact {
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
}

/// The fields of an issue a notification needs, captured at commit time.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct IssueSnapshot {
    pub id: String,
    pub key: String,
    pub title: String,
    pub description: String,
    pub status: IssueStatus,
    pub priority: Priority,
    pub project_name: String,
}

impl IssueSnapshot {
    #[must_use]
    pub fn of(issue: &Issue, project_name: &str) -> Self {
        Self {
            id: issue.id.clone(),
            key: issue.key.clone(),
            title: issue.title.clone(),
            description: issue.description.clone(),
            status: issue.status,
            priority: issue.priority,
            project_name: project_name.to_string(),
        }
    }
}

/// A committed assignment change.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueEvent {
    Assigned {
        issue: IssueSnapshot,
        actor_id: String,
        assignee: Contact,
    },
    Reassigned {
        issue: IssueSnapshot,
        actor_id: String,
        previous: Contact,
        next: Contact,
        reason: Option<String>,
    },
    Unassigned {
        issue: IssueSnapshot,
        actor_id: String,
        previous: Contact,
        reason: Option<String>,
    },
}

impl IssueEvent {
    #[must_use]
    pub const fn issue(&self) -> &IssueSnapshot {
        match self {
            Self::Assigned { issue, .. }
            | Self::Reassigned { issue, .. }
            | Self::Unassigned { issue, .. } => issue,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Assigned { .. } => "assigned",
            Self::Reassigned { .. } => "reassigned",
            Self::Unassigned { .. } => "unassigned",
        }
    }
}

/// Consumer of post-commit domain events.
///
/// `publish` must not block on delivery. An `Err` is logged by the caller and
/// otherwise ignored.
pub trait EventSink: Send + Sync {
    /// Hand an event over for asynchronous processing.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if the event could not be accepted (e.g. the
    /// consumer has shut down).
    fn publish(&self, event: IssueEvent) -> Result<(), CoreError>;
}
