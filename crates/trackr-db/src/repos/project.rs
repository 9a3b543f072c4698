//! Project repository: creation, lookup, status changes, key sequencing.

use trackr_core::entities::Project;
use trackr_core::enums::ProjectStatus;
use trackr_core::ids::PREFIX_PROJECT;

use crate::error::{DatabaseError, not_found, validation};
use crate::helpers::{fmt_datetime, now, parse_datetime, parse_enum};
use crate::service::TrackrService;

const SELECT_COLS: &str = "id, key, name, status, issue_seq, created_at";

fn row_to_project(row: &libsql::Row) -> Result<Project, DatabaseError> {
    Ok(Project {
        id: row.get(0)?,
        key: row.get(1)?,
        name: row.get(2)?,
        status: parse_enum(&row.get::<String>(3)?)?,
        issue_seq: row.get(4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

/// Normalize and check a project key: 2-10 upper-case ASCII letters or
/// digits, starting with a letter.
fn normalize_key(key: &str) -> Result<String, DatabaseError> {
    let key = key.trim().to_ascii_uppercase();
    let well_formed = (2..=10).contains(&key.len())
        && key.starts_with(|c: char| c.is_ascii_alphabetic())
        && key.chars().all(|c| c.is_ascii_alphanumeric());
    if !well_formed {
        return Err(validation(format!(
            "Project key '{key}' must be 2-10 letters or digits, starting with a letter"
        )));
    }
    Ok(key)
}

impl TrackrService {
    /// # Errors
    ///
    /// Returns a validation error for a malformed or taken key or an empty
    /// name, `DatabaseError` otherwise.
    pub async fn create_project(&self, key: &str, name: &str) -> Result<Project, DatabaseError> {
        let key = normalize_key(key)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(validation("Project name is required"));
        }
        if self.get_project_by_key(&key).await?.is_some() {
            return Err(validation(format!("Project key '{key}' is already in use")));
        }

        let now = now();
        let id = self.db().generate_id(PREFIX_PROJECT).await?;
        let tx = self.db().begin_write().await?;
        let result = tx
            .execute(
                "INSERT INTO projects (id, key, name, status, issue_seq, created_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                libsql::params![
                    id.as_str(),
                    key.as_str(),
                    name,
                    ProjectStatus::Active.as_str(),
                    fmt_datetime(&now)
                ],
            )
            .await
            .map_err(DatabaseError::from);
        tx.finish(result).await?;

        tracing::info!(project_id = %id, key, "created project");
        Ok(Project {
            id,
            key,
            name: name.to_string(),
            status: ProjectStatus::Active,
            issue_seq: 0,
            created_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns a not-found error if no project has this id.
    pub async fn get_project(&self, id: &str) -> Result<Project, DatabaseError> {
        let conn = self.db().read().await;
        let mut rows = conn
            .query(
                &format!("SELECT {SELECT_COLS} FROM projects WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or_else(|| not_found("project", id))?;
        row_to_project(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_project_by_key(&self, key: &str) -> Result<Option<Project>, DatabaseError> {
        let key = key.trim().to_ascii_uppercase();
        let conn = self.db().read().await;
        let mut rows = conn
            .query(
                &format!("SELECT {SELECT_COLS} FROM projects WHERE key = ?1"),
                [key.as_str()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_project(&row)?)),
            None => Ok(None),
        }
    }

    /// Resolve either a project id or a project key.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if neither matches.
    pub async fn resolve_project(&self, id_or_key: &str) -> Result<Project, DatabaseError> {
        if let Some(project) = self.get_project_by_key(id_or_key).await? {
            return Ok(project);
        }
        self.get_project(id_or_key).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_projects(&self) -> Result<Vec<Project>, DatabaseError> {
        let conn = self.db().read().await;
        let mut rows = conn
            .query(
                &format!("SELECT {SELECT_COLS} FROM projects ORDER BY key"),
                (),
            )
            .await?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next().await? {
            projects.push(row_to_project(&row)?);
        }
        Ok(projects)
    }

    /// # Errors
    ///
    /// Returns a not-found error if no project has this id.
    pub async fn set_project_status(
        &self,
        id: &str,
        status: ProjectStatus,
    ) -> Result<Project, DatabaseError> {
        let tx = self.db().begin_write().await?;
        let result = tx
            .execute(
                "UPDATE projects SET status = ?1 WHERE id = ?2",
                libsql::params![status.as_str(), id],
            )
            .await
            .map_err(DatabaseError::from);
        let changed = tx.finish(result).await?;
        if changed == 0 {
            return Err(not_found("project", id));
        }
        tracing::info!(project_id = id, %status, "changed project status");
        self.get_project(id).await
    }

    /// Hand out the next issue sequence number. Must run inside `tx`.
    pub(crate) async fn next_issue_seq(
        tx: &libsql::Connection,
        project_id: &str,
    ) -> Result<i64, DatabaseError> {
        tx.execute(
            "UPDATE projects SET issue_seq = issue_seq + 1 WHERE id = ?1",
            [project_id],
        )
        .await?;
        let mut rows = tx
            .query("SELECT issue_seq FROM projects WHERE id = ?1", [project_id])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::helpers::test_service;
    use pretty_assertions::assert_eq;
    use trackr_core::enums::ProjectStatus;
    use trackr_core::errors::ErrorKind;

    #[tokio::test]
    async fn create_and_get_project() {
        let (svc, _) = test_service().await;
        let project = svc.create_project(" proj ", "Payments").await.unwrap();
        assert_eq!(project.key, "PROJ");
        assert!(project.id.starts_with("prj-"));

        let fetched = svc.get_project(&project.id).await.unwrap();
        assert_eq!(fetched, project);
        assert_eq!(svc.resolve_project("proj").await.unwrap().id, project.id);
    }

    #[tokio::test]
    async fn duplicate_key_rejected() {
        let (svc, _) = test_service().await;
        svc.create_project("PROJ", "One").await.unwrap();
        let err = svc.create_project("proj", "Two").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn malformed_key_rejected() {
        let (svc, _) = test_service().await;
        for key in ["", "X", "1ABC", "AB-C", "ABCDEFGHIJK"] {
            let err = svc.create_project(key, "P").await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "key {key:?}");
        }
    }

    #[tokio::test]
    async fn archive_project() {
        let (svc, _) = test_service().await;
        let project = svc.create_project("PROJ", "P").await.unwrap();
        let archived = svc
            .set_project_status(&project.id, ProjectStatus::Archived)
            .await
            .unwrap();
        assert_eq!(archived.status, ProjectStatus::Archived);

        let err = svc
            .set_project_status("prj-missing", ProjectStatus::Active)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn unknown_project_not_found() {
        let (svc, _) = test_service().await;
        let err = svc.get_project("prj-00000000").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(svc.get_project_by_key("NOPE").await.unwrap().is_none());
    }
}
