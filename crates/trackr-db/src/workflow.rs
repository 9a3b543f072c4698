//! Assignment workflow: assign, reassign, unassign.
//!
//! Each operation validates against a fresh read, consults the membership
//! oracle, then writes the new assignee and its history entry in one
//! transaction guarded by the observed version. Events go out only after the
//! commit, and a failure to publish never fails the operation.

use serde_json::{Value, json};
use trackr_core::entities::Issue;
use trackr_core::enums::{AuditAction, ProjectStatus};
use trackr_core::errors::CoreError;
use trackr_core::events::{Contact, IssueEvent, IssueSnapshot};
use trackr_core::responses::ApiResponse;

use crate::error::{DatabaseError, conflict, forbidden, validation};
use crate::helpers::{fmt_datetime, now};
use crate::oracle::member_contact;
use crate::repos::audit::AuditDraft;
use crate::service::{TrackrService, check_expected_version, stale_write};

/// Longest reason accepted on reassign/unassign, in characters.
pub const MAX_REASON_CHARS: usize = 500;

const NOT_A_MEMBER: &str = "User is not an active member of this project and cannot be assigned";

/// Trim a free-text reason; blank becomes `None`.
///
/// # Errors
///
/// Returns a validation error if the trimmed reason is too long.
pub fn normalize_reason(reason: Option<&str>) -> Result<Option<String>, DatabaseError> {
    let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    if reason.chars().count() > MAX_REASON_CHARS {
        return Err(validation(format!(
            "Reason must be at most {MAX_REASON_CHARS} characters"
        )));
    }
    Ok(Some(reason.to_string()))
}

impl TrackrService {
    /// Conditionally write the assignee (or just bump the version when
    /// `assignee` equals the stored value) and append one history entry.
    async fn write_assignment(
        &self,
        issue: &Issue,
        actor_id: &str,
        assignee: Option<&str>,
        draft: AuditDraft,
    ) -> Result<Issue, DatabaseError> {
        let now = now();
        let tx = self.db().begin_write().await?;
        let result = async {
            let changed = tx
                .execute(
                    "UPDATE issues SET assignee_id = ?1, updated_at = ?2, version = version + 1
                     WHERE id = ?3 AND version = ?4 AND is_deleted = 0",
                    libsql::params![assignee, fmt_datetime(&now), issue.id.as_str(), issue.version],
                )
                .await?;
            if changed == 0 {
                return Err(stale_write(&issue.key));
            }
            self.append_audit(&tx, &issue.id, actor_id, &now, &draft)
                .await?;
            Ok::<_, DatabaseError>(())
        }
        .await;
        tx.finish(result).await?;

        let mut updated = issue.clone();
        updated.assignee_id = assignee.map(String::from);
        updated.version = issue.version + 1;
        updated.updated_at = now;
        Ok(updated)
    }

    /// Contact for a previous assignee, falling back to the bare id.
    async fn previous_contact(&self, user_id: &str) -> Contact {
        match self.directory().contact(user_id).await {
            Ok(Some(contact)) => contact,
            Ok(None) => Contact {
                user_id: user_id.to_string(),
                name: user_id.to_string(),
                email: None,
            },
            Err(error) => {
                tracing::warn!(%error, user_id, "contact lookup failed after commit");
                Contact {
                    user_id: user_id.to_string(),
                    name: user_id.to_string(),
                    email: None,
                }
            }
        }
    }

    /// Assign an unassigned issue.
    ///
    /// # Errors
    ///
    /// - not-found if the issue is absent or deleted
    /// - conflict if it is already assigned, closed, in an archived project,
    ///   or its version moved
    /// - forbidden if the assignee is not an active project member
    pub async fn assign_issue(
        &self,
        actor_id: &str,
        issue_id: &str,
        assignee_id: &str,
        expected_version: Option<i64>,
    ) -> Result<ApiResponse<Issue>, DatabaseError> {
        let issue = self.require_issue(issue_id).await?;
        check_expected_version(&issue.key, issue.version, expected_version)?;
        let project = self.get_project(&issue.project_id).await?;

        if issue.status.locks_assign() {
            return Err(conflict(format!(
                "Cannot assign issue {} with status: {}",
                issue.key, issue.status
            )));
        }
        if project.status == ProjectStatus::Archived {
            return Err(conflict(format!(
                "Cannot assign issue {} in archived project {}",
                issue.key, project.key
            )));
        }
        if issue.assignee_id.is_some() {
            return Err(conflict(format!(
                "Issue {} is already assigned; use reassign",
                issue.key
            )));
        }
        let member = self
            .oracle()
            .active_member(&project.id, assignee_id)
            .await?
            .ok_or_else(|| forbidden(NOT_A_MEMBER))?;

        let draft = AuditDraft::new(
            AuditAction::Assign,
            "assignee",
            Value::Null,
            json!(member.user_id),
        );
        let updated = self
            .write_assignment(&issue, actor_id, Some(&member.user_id), draft)
            .await?;

        tracing::info!(key = %updated.key, assignee = %member.user_id, actor_id, "assigned issue");
        self.publish(IssueEvent::Assigned {
            issue: IssueSnapshot::of(&updated, &project.name),
            actor_id: actor_id.to_string(),
            assignee: member_contact(&member),
        });
        Ok(ApiResponse::ok(updated, "Issue assigned successfully"))
    }

    /// Move an assigned issue to another member.
    ///
    /// Reassigning to the current assignee is accepted: the version still
    /// advances and a history entry is written, but no event is emitted.
    ///
    /// # Errors
    ///
    /// - validation for an over-long reason
    /// - not-found if the issue is absent or deleted
    /// - conflict if it is unassigned, done or closed, or its version moved
    /// - forbidden if the new assignee is not an active project member
    pub async fn reassign_issue(
        &self,
        actor_id: &str,
        issue_id: &str,
        assignee_id: &str,
        reason: Option<&str>,
        expected_version: Option<i64>,
    ) -> Result<ApiResponse<Issue>, DatabaseError> {
        let reason = normalize_reason(reason)?;
        let issue = self.require_issue(issue_id).await?;
        check_expected_version(&issue.key, issue.version, expected_version)?;
        let project = self.get_project(&issue.project_id).await?;

        if issue.status.locks_reassign() {
            return Err(conflict(format!(
                "Cannot reassign issue {} with status: {}",
                issue.key, issue.status
            )));
        }
        let Some(previous_id) = issue.assignee_id.clone() else {
            return Err(conflict(format!(
                "Issue {} is not assigned; use assign",
                issue.key
            )));
        };
        let member = self
            .oracle()
            .active_member(&project.id, assignee_id)
            .await?
            .ok_or_else(|| forbidden(NOT_A_MEMBER))?;

        let draft = AuditDraft::new(
            AuditAction::Reassign,
            "assignee",
            json!(previous_id),
            json!(member.user_id),
        )
        .with_reason(reason.clone());
        let updated = self
            .write_assignment(&issue, actor_id, Some(&member.user_id), draft)
            .await?;

        if previous_id == member.user_id {
            tracing::info!(key = %updated.key, actor_id, "reassignment to current assignee logged");
            return Ok(ApiResponse::ok(
                updated,
                "Issue reassignment logged (no change needed)",
            ));
        }

        tracing::info!(
            key = %updated.key,
            from = %previous_id,
            to = %member.user_id,
            actor_id,
            "reassigned issue"
        );
        let previous = self.previous_contact(&previous_id).await;
        self.publish(IssueEvent::Reassigned {
            issue: IssueSnapshot::of(&updated, &project.name),
            actor_id: actor_id.to_string(),
            previous,
            next: member_contact(&member),
            reason,
        });
        Ok(ApiResponse::ok(updated, "Issue reassigned successfully"))
    }

    /// Clear the assignee.
    ///
    /// # Errors
    ///
    /// - validation for an over-long reason
    /// - not-found if the issue is absent or deleted
    /// - no-op if it is already unassigned
    /// - conflict if it is done or closed, or its version moved
    pub async fn unassign_issue(
        &self,
        actor_id: &str,
        issue_id: &str,
        reason: Option<&str>,
        expected_version: Option<i64>,
    ) -> Result<ApiResponse<Issue>, DatabaseError> {
        let reason = normalize_reason(reason)?;
        let issue = self.require_issue(issue_id).await?;
        check_expected_version(&issue.key, issue.version, expected_version)?;

        let Some(previous_id) = issue.assignee_id.clone() else {
            return Err(CoreError::NoOp(format!("Issue {} is already unassigned", issue.key)).into());
        };
        if issue.status.locks_reassign() {
            return Err(conflict(format!(
                "Cannot unassign issue {} with status: {}",
                issue.key, issue.status
            )));
        }
        let project = self.get_project(&issue.project_id).await?;

        let draft = AuditDraft::new(
            AuditAction::Unassign,
            "assignee",
            json!(previous_id),
            Value::Null,
        )
        .with_reason(reason.clone());
        let updated = self.write_assignment(&issue, actor_id, None, draft).await?;

        tracing::info!(key = %updated.key, from = %previous_id, actor_id, "unassigned issue");
        let previous = self.previous_contact(&previous_id).await;
        self.publish(IssueEvent::Unassigned {
            issue: IssueSnapshot::of(&updated, &project.name),
            actor_id: actor_id.to_string(),
            previous,
            reason,
        });
        Ok(ApiResponse::ok(updated, "Issue unassigned successfully"))
    }
}
