//! User repository.

use trackr_core::entities::User;
use trackr_core::ids::PREFIX_USER;

use crate::error::{DatabaseError, not_found, validation};
use crate::helpers::{fmt_datetime, get_opt_string, now, parse_datetime};
use crate::service::TrackrService;

impl TrackrService {
    /// # Errors
    ///
    /// Returns a validation error for an empty name or an address without `@`.
    pub async fn create_user(&self, name: &str, email: Option<&str>) -> Result<User, DatabaseError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(validation("User name is required"));
        }
        let email = email.map(str::trim).filter(|e| !e.is_empty());
        if let Some(email) = email {
            if !email.contains('@') {
                return Err(validation(format!("'{email}' is not an email address")));
            }
        }

        let now = now();
        let id = self.db().generate_id(PREFIX_USER).await?;
        let tx = self.db().begin_write().await?;
        let result = tx
            .execute(
                "INSERT INTO users (id, name, email, created_at) VALUES (?1, ?2, ?3, ?4)",
                libsql::params![id.as_str(), name, email, fmt_datetime(&now)],
            )
            .await
            .map_err(DatabaseError::from);
        tx.finish(result).await?;

        tracing::info!(user_id = %id, "created user");
        Ok(User {
            id,
            name: name.to_string(),
            email: email.map(String::from),
            created_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns a not-found error if no user has this id.
    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        let conn = self.db().read().await;
        let mut rows = conn
            .query(
                "SELECT id, name, email, created_at FROM users WHERE id = ?1",
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or_else(|| not_found("user", id))?;
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: get_opt_string(&row, 2)?,
            created_at: parse_datetime(&row.get::<String>(3)?)?,
        })
    }
}
