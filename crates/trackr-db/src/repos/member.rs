//! Project membership repository.
//!
//! Memberships are never deleted. Deactivation flips `is_active`, which is
//! what the membership oracle checks before an assignment.

use trackr_core::entities::Member;
use trackr_core::enums::MemberRole;

use crate::error::{DatabaseError, not_found};
use crate::helpers::{fmt_datetime, get_opt_string, now, parse_datetime, parse_enum};
use crate::service::TrackrService;

const SELECT_COLS: &str = "m.project_id, m.user_id, u.name, u.email, m.role, m.is_active, m.joined_at";

fn row_to_member(row: &libsql::Row) -> Result<Member, DatabaseError> {
    Ok(Member {
        project_id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        email: get_opt_string(row, 3)?,
        role: parse_enum(&row.get::<String>(4)?)?,
        is_active: row.get::<i64>(5)? != 0,
        joined_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

impl TrackrService {
    /// Add a user to a project, or reactivate them with the given role.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the project or user does not exist.
    pub async fn add_member(
        &self,
        project_id: &str,
        user_id: &str,
        role: MemberRole,
    ) -> Result<Member, DatabaseError> {
        self.get_project(project_id).await?;
        self.get_user(user_id).await?;

        let tx = self.db().begin_write().await?;
        let result = tx
            .execute(
                "INSERT INTO project_members (project_id, user_id, role, is_active, joined_at)
                 VALUES (?1, ?2, ?3, 1, ?4)
                 ON CONFLICT (project_id, user_id) DO UPDATE SET role = excluded.role, is_active = 1",
                libsql::params![project_id, user_id, role.as_str(), fmt_datetime(&now())],
            )
            .await
            .map_err(DatabaseError::from);
        tx.finish(result).await?;

        tracing::info!(project_id, user_id, %role, "added project member");
        self.get_member(project_id, user_id).await
    }

    /// # Errors
    ///
    /// Returns a not-found error if the user was never a member.
    pub async fn set_member_active(
        &self,
        project_id: &str,
        user_id: &str,
        active: bool,
    ) -> Result<Member, DatabaseError> {
        let tx = self.db().begin_write().await?;
        let result = tx
            .execute(
                "UPDATE project_members SET is_active = ?1 WHERE project_id = ?2 AND user_id = ?3",
                libsql::params![i64::from(active), project_id, user_id],
            )
            .await
            .map_err(DatabaseError::from);
        if tx.finish(result).await? == 0 {
            return Err(not_found("member", &format!("{project_id}/{user_id}")));
        }
        tracing::info!(project_id, user_id, active, "changed membership state");
        self.get_member(project_id, user_id).await
    }

    /// Membership regardless of `is_active`.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the user was never a member.
    pub async fn get_member(&self, project_id: &str, user_id: &str) -> Result<Member, DatabaseError> {
        let conn = self.db().read().await;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM project_members m JOIN users u ON u.id = m.user_id
                     WHERE m.project_id = ?1 AND m.user_id = ?2"
                ),
                [project_id, user_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| not_found("member", &format!("{project_id}/{user_id}")))?;
        row_to_member(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_members(&self, project_id: &str) -> Result<Vec<Member>, DatabaseError> {
        let conn = self.db().read().await;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM project_members m JOIN users u ON u.id = m.user_id
                     WHERE m.project_id = ?1 ORDER BY m.joined_at, u.name"
                ),
                [project_id],
            )
            .await?;
        let mut members = Vec::new();
        while let Some(row) = rows.next().await? {
            members.push(row_to_member(&row)?);
        }
        Ok(members)
    }
}
