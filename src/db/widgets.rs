use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use super::*;

impl CrmDb {
    // =========================================================================
    // Dashboard widgets
    // =========================================================================

    /// Helper: map a row to `DbWidget`.
    pub(crate) fn map_widget_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbWidget> {
        Ok(DbWidget {
            id: row.get(0)?,
            account_id: row.get(1)?,
            name: row.get(2)?,
            widget_type: WidgetType::from_str_lossy(&row.get::<_, String>(3)?),
            description: row.get(4)?,
            configuration: row.get(5)?,
            is_active: row.get::<_, i32>(6)? != 0,
            position: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    /// Create a dashboard widget. The configuration blob must be valid JSON;
    /// it defaults to an empty object.
    pub fn create_widget(&self, input: &NewWidget) -> Result<DbWidget, DbError> {
        let configuration = input
            .configuration
            .clone()
            .unwrap_or_else(|| "{}".to_string());
        if serde_json::from_str::<serde_json::Value>(&configuration).is_err() {
            return Err(DbError::Invalid(
                "Widget configuration must be valid JSON".to_string(),
            ));
        }

        let now = Utc::now().to_rfc3339();
        let widget = DbWidget {
            id: Uuid::new_v4().to_string(),
            account_id: input.account_id.clone(),
            name: input.name.clone(),
            widget_type: input.widget_type,
            description: input.description.clone(),
            configuration,
            is_active: input.is_active,
            position: input.position,
            created_at: now.clone(),
            updated_at: now,
        };
        self.conn.execute(
            "INSERT INTO dashboard_widgets (id, account_id, name, widget_type,
                description, configuration, is_active, position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                widget.id,
                widget.account_id,
                widget.name,
                widget.widget_type.as_str(),
                widget.description,
                widget.configuration,
                widget.is_active as i32,
                widget.position,
                widget.created_at,
                widget.updated_at,
            ],
        )?;
        Ok(widget)
    }

    /// Get a widget by id, scoped to the owning account.
    pub fn get_widget(&self, account_id: &str, id: &str) -> Result<Option<DbWidget>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, account_id, name, widget_type, description, configuration,
                    is_active, position, created_at, updated_at
             FROM dashboard_widgets WHERE id = ?1 AND account_id = ?2",
        )?;
        let mut rows = stmt.query_map(params![id, account_id], Self::map_widget_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// An account's active widgets, ordered by position then name.
    pub fn active_widgets(&self, account_id: &str) -> Result<Vec<DbWidget>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, account_id, name, widget_type, description, configuration,
                    is_active, position, created_at, updated_at
             FROM dashboard_widgets
             WHERE account_id = ?1 AND is_active = 1
             ORDER BY position, name",
        )?;
        let rows = stmt.query_map(params![account_id], Self::map_widget_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // =========================================================================
    // Quick actions
    // =========================================================================

    /// Helper: map a row to `DbQuickAction`.
    pub(crate) fn map_quick_action_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbQuickAction> {
        Ok(DbQuickAction {
            id: row.get(0)?,
            account_id: row.get(1)?,
            name: row.get(2)?,
            icon: row.get(3)?,
            url: row.get(4)?,
            description: row.get(5)?,
            is_active: row.get::<_, i32>(6)? != 0,
            position: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    /// Create a quick action shortcut.
    pub fn create_quick_action(&self, input: &NewQuickAction) -> Result<DbQuickAction, DbError> {
        let now = Utc::now().to_rfc3339();
        let action = DbQuickAction {
            id: Uuid::new_v4().to_string(),
            account_id: input.account_id.clone(),
            name: input.name.clone(),
            icon: input.icon.clone(),
            url: input.url.clone(),
            description: input.description.clone(),
            is_active: input.is_active,
            position: input.position,
            created_at: now.clone(),
            updated_at: now,
        };
        self.conn.execute(
            "INSERT INTO quick_actions (id, account_id, name, icon, url, description,
                is_active, position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                action.id,
                action.account_id,
                action.name,
                action.icon,
                action.url,
                action.description,
                action.is_active as i32,
                action.position,
                action.created_at,
                action.updated_at,
            ],
        )?;
        Ok(action)
    }

    /// An account's active quick actions, ordered by position then name,
    /// capped at `limit`.
    pub fn active_quick_actions(
        &self,
        account_id: &str,
        limit: i64,
    ) -> Result<Vec<DbQuickAction>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, account_id, name, icon, url, description,
                    is_active, position, created_at, updated_at
             FROM quick_actions
             WHERE account_id = ?1 AND is_active = 1
             ORDER BY position, name
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![account_id, limit], Self::map_quick_action_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
