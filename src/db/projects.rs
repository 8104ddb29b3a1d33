use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use super::*;

impl CrmDb {
    /// Helper: map a row to `DbProject`.
    pub(crate) fn map_project_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbProject> {
        Ok(DbProject {
            id: row.get(0)?,
            account_id: row.get(1)?,
            name: row.get(2)?,
            status: ProjectStatus::from_str_lossy(&row.get::<_, String>(3)?),
            description: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    /// Create a project.
    pub fn create_project(&self, input: &NewProject) -> Result<DbProject, DbError> {
        let now = Utc::now().to_rfc3339();
        let project = DbProject {
            id: Uuid::new_v4().to_string(),
            account_id: input.account_id.clone(),
            name: input.name.clone(),
            status: input.status.unwrap_or(ProjectStatus::Planning),
            description: input.description.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        self.conn.execute(
            "INSERT INTO projects (id, account_id, name, status, description,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                project.id,
                project.account_id,
                project.name,
                project.status.as_str(),
                project.description,
                project.created_at,
                project.updated_at,
            ],
        )?;
        Ok(project)
    }

    /// Get a project by id, scoped to the owning account.
    pub fn get_project(&self, account_id: &str, id: &str) -> Result<Option<DbProject>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, account_id, name, status, description, created_at, updated_at
             FROM projects WHERE id = ?1 AND account_id = ?2",
        )?;
        let mut rows = stmt.query_map(params![id, account_id], Self::map_project_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Set a project's status, stamping updated_at.
    pub fn set_project_status(
        &self,
        account_id: &str,
        id: &str,
        status: ProjectStatus,
    ) -> Result<bool, DbError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE projects SET status = ?1, updated_at = ?2
             WHERE id = ?3 AND account_id = ?4",
            params![status.as_str(), now, id, account_id],
        )?;
        Ok(changed > 0)
    }

    /// Most recently created projects for an account, newest first.
    pub fn recent_projects(&self, account_id: &str, limit: i64) -> Result<Vec<DbProject>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, account_id, name, status, description, created_at, updated_at
             FROM projects
             WHERE account_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![account_id, limit], Self::map_project_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Count of an account's projects still moving (planning or in progress).
    pub fn count_open_projects(&self, account_id: &str) -> Result<i64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM projects
             WHERE account_id = ?1 AND status IN ('in_progress', 'planning')",
            params![account_id],
            |row| row.get(0),
        )?)
    }

    /// Frequency of each project status for an account.
    pub fn project_status_distribution(
        &self,
        account_id: &str,
    ) -> Result<Vec<(ProjectStatus, i64)>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT status, COUNT(*) FROM projects
             WHERE account_id = ?1
             GROUP BY status
             ORDER BY status",
        )?;
        let rows = stmt.query_map(params![account_id], |row| {
            Ok((
                ProjectStatus::from_str_lossy(&row.get::<_, String>(0)?),
                row.get::<_, i64>(1)?,
            ))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Total project count across all accounts. Snapshot recomputation only.
    pub fn count_projects(&self) -> Result<i64, DbError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?)
    }

    /// Completed projects across all accounts. Snapshot recomputation only.
    pub fn count_completed_projects(&self) -> Result<i64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM projects WHERE status = 'completed'",
            [],
            |row| row.get(0),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::test_db;
    use super::*;

    fn sample_project(account_id: &str, name: &str, status: ProjectStatus) -> NewProject {
        NewProject {
            account_id: account_id.to_string(),
            name: name.to_string(),
            status: Some(status),
            description: None,
        }
    }

    #[test]
    fn test_create_and_get_project() {
        let db = test_db();
        let project = db
            .create_project(&sample_project("acct-1", "Website revamp", ProjectStatus::Planning))
            .expect("create");

        let fetched = db
            .get_project("acct-1", &project.id)
            .expect("get")
            .expect("exists");
        assert_eq!(fetched.name, "Website revamp");
        assert_eq!(fetched.status, ProjectStatus::Planning);

        // Cross-account read returns nothing
        assert!(db.get_project("acct-2", &project.id).expect("get").is_none());
    }

    #[test]
    fn test_count_open_projects() {
        let db = test_db();
        db.create_project(&sample_project("acct-1", "A", ProjectStatus::Planning))
            .expect("create");
        db.create_project(&sample_project("acct-1", "B", ProjectStatus::InProgress))
            .expect("create");
        db.create_project(&sample_project("acct-1", "C", ProjectStatus::Completed))
            .expect("create");
        db.create_project(&sample_project("acct-1", "D", ProjectStatus::OnHold))
            .expect("create");
        db.create_project(&sample_project("acct-2", "E", ProjectStatus::Planning))
            .expect("create");

        let open = db.count_open_projects("acct-1").expect("count");
        assert_eq!(open, 2, "planning + in_progress only, own account only");
    }

    #[test]
    fn test_status_distribution() {
        let db = test_db();
        db.create_project(&sample_project("acct-1", "A", ProjectStatus::Planning))
            .expect("create");
        db.create_project(&sample_project("acct-1", "B", ProjectStatus::Planning))
            .expect("create");
        db.create_project(&sample_project("acct-1", "C", ProjectStatus::Cancelled))
            .expect("create");
        db.create_project(&sample_project("acct-2", "D", ProjectStatus::Completed))
            .expect("create");

        let dist = db.project_status_distribution("acct-1").expect("dist");
        assert_eq!(dist.len(), 2);
        assert!(dist.contains(&(ProjectStatus::Planning, 2)));
        assert!(dist.contains(&(ProjectStatus::Cancelled, 1)));
    }

    #[test]
    fn test_set_project_status_scoped() {
        let db = test_db();
        let project = db
            .create_project(&sample_project("acct-1", "A", ProjectStatus::Planning))
            .expect("create");

        let miss = db
            .set_project_status("acct-2", &project.id, ProjectStatus::Completed)
            .expect("update");
        assert!(!miss, "other account must not be able to update");

        let hit = db
            .set_project_status("acct-1", &project.id, ProjectStatus::Completed)
            .expect("update");
        assert!(hit);
        assert_eq!(db.count_completed_projects().expect("count"), 1);
    }

    #[test]
    fn test_recent_projects_cap() {
        let db = test_db();
        for i in 0..8 {
            db.conn_ref()
                .execute(
                    "INSERT INTO projects (id, account_id, name, status, created_at, updated_at)
                     VALUES (?1, 'acct-1', ?2, 'planning', ?3, ?3)",
                    params![
                        format!("proj-{i}"),
                        format!("Project {i}"),
                        format!("2026-02-0{}T00:00:00+00:00", i + 1),
                    ],
                )
                .expect("insert");
        }

        let recent = db.recent_projects("acct-1", 5).expect("query");
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].id, "proj-7", "newest first");
    }
}
