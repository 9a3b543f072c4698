//! Seams to the outside world the workflow consults but does not own.
//!
//! [`MembershipOracle`] answers "may this user be assigned in this project?".
//! [`UserDirectory`] resolves a user to contact details for notifications.
//! [`SqlDirectory`] implements both over the local `project_members` and
//! `users` tables.

use async_trait::async_trait;
use trackr_core::entities::Member;
use trackr_core::events::Contact;

use crate::DbReader;
use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum};

/// Source of truth for project membership.
#[async_trait]
pub trait MembershipOracle: Send + Sync {
    /// The user's membership in the project, only if it is active.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the lookup itself fails.
    async fn active_member(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<Option<Member>, DatabaseError>;
}

/// Resolves user ids to notification contacts.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// # Errors
    ///
    /// Returns `DatabaseError` if the lookup itself fails.
    async fn contact(&self, user_id: &str) -> Result<Option<Contact>, DatabaseError>;
}

/// Membership and contact lookups backed by the trackr database.
#[derive(Clone)]
pub struct SqlDirectory {
    reader: DbReader,
}

impl SqlDirectory {
    #[must_use]
    pub const fn new(reader: DbReader) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl MembershipOracle for SqlDirectory {
    async fn active_member(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<Option<Member>, DatabaseError> {
        let conn = self.reader.read().await;
        let mut rows = conn
            .query(
                "SELECT m.project_id, m.user_id, u.name, u.email, m.role, m.is_active, m.joined_at
                 FROM project_members m
                 JOIN users u ON u.id = m.user_id
                 WHERE m.project_id = ?1 AND m.user_id = ?2 AND m.is_active = 1",
                [project_id, user_id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        Ok(Some(Member {
            project_id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            email: get_opt_string(&row, 3)?,
            role: parse_enum(&row.get::<String>(4)?)?,
            is_active: row.get::<i64>(5)? != 0,
            joined_at: parse_datetime(&row.get::<String>(6)?)?,
        }))
    }
}

#[async_trait]
impl UserDirectory for SqlDirectory {
    async fn contact(&self, user_id: &str) -> Result<Option<Contact>, DatabaseError> {
        let conn = self.reader.read().await;
        let mut rows = conn
            .query("SELECT id, name, email FROM users WHERE id = ?1", [user_id])
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        Ok(Some(Contact {
            user_id: row.get(0)?,
            name: row.get(1)?,
            email: get_opt_string(&row, 2)?,
        }))
    }
}

/// Convert a membership into the contact carried by events.
#[must_use]
pub fn member_contact(member: &Member) -> Contact {
    Contact {
        user_id: member.user_id.clone(),
        name: member.name.clone(),
        email: member.email.clone(),
    }
}
