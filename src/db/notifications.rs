use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use super::*;

impl CrmDb {
    /// Helper: map a row to `DbNotification`.
    pub(crate) fn map_notification_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbNotification> {
        Ok(DbNotification {
            id: row.get(0)?,
            account_id: row.get(1)?,
            title: row.get(2)?,
            message: row.get(3)?,
            priority: NotificationPriority::from_str_lossy(&row.get::<_, String>(4)?),
            is_read: row.get::<_, i32>(5)? != 0,
            action_url: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    /// Insert a notification. Producers live outside this subsystem; this is
    /// the single write path they (and tests) use. Rows start unread.
    pub fn insert_notification(&self, input: &NewNotification) -> Result<DbNotification, DbError> {
        let notification = DbNotification {
            id: Uuid::new_v4().to_string(),
            account_id: input.account_id.clone(),
            title: input.title.clone(),
            message: input.message.clone(),
            priority: input.priority,
            is_read: false,
            action_url: input.action_url.clone(),
            created_at: Utc::now().to_rfc3339(),
        };
        self.conn.execute(
            "INSERT INTO notifications (id, account_id, title, message, priority,
                is_read, action_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7)",
            params![
                notification.id,
                notification.account_id,
                notification.title,
                notification.message,
                notification.priority.as_str(),
                notification.action_url,
                notification.created_at,
            ],
        )?;
        Ok(notification)
    }

    /// Get a notification by id, scoped to the owning account.
    pub fn get_notification(
        &self,
        account_id: &str,
        id: &str,
    ) -> Result<Option<DbNotification>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, account_id, title, message, priority, is_read, action_url, created_at
             FROM notifications WHERE id = ?1 AND account_id = ?2",
        )?;
        let mut rows = stmt.query_map(params![id, account_id], Self::map_notification_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// An account's most recent notifications (any read state), newest first.
    pub fn recent_notifications(
        &self,
        account_id: &str,
        limit: i64,
    ) -> Result<Vec<DbNotification>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, account_id, title, message, priority, is_read, action_url, created_at
             FROM notifications
             WHERE account_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![account_id, limit], Self::map_notification_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Count of an account's unread notifications.
    pub fn count_unread_notifications(&self, account_id: &str) -> Result<i64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE account_id = ?1 AND is_read = 0",
            params![account_id],
            |row| row.get(0),
        )?)
    }

    /// Flip a notification to read. Idempotent: already-read rows still count
    /// as matched. Returns false when the id doesn't exist for the account —
    /// the read flag is the only thing this can ever change.
    pub fn mark_notification_read(&self, account_id: &str, id: &str) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND account_id = ?2",
            params![id, account_id],
        )?;
        Ok(changed > 0)
    }

    /// Flip every unread notification for the account to read.
    /// Returns the number of rows updated (0 when none were unread).
    pub fn mark_all_notifications_read(&self, account_id: &str) -> Result<usize, DbError> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE account_id = ?1 AND is_read = 0",
            params![account_id],
        )?;
        Ok(changed)
    }
}
