//! Notification center.
//!
//! Read-state transitions for an account's notifications. Creation and
//! deletion live with external producers; the only mutation exposed here is
//! unread → read.

use crate::db::CrmDb;
use crate::error::CrmError;
use crate::types::Ack;

/// Mark one notification as read. NotFound when the id doesn't exist or the
/// notification belongs to another account. Idempotent on already-read rows.
pub fn mark_read(db: &CrmDb, account_id: &str, notification_id: &str) -> Result<Ack, CrmError> {
    let matched = db.mark_notification_read(account_id, notification_id)?;
    if !matched {
        return Err(CrmError::not_found("Notification"));
    }
    Ok(Ack::ok("Notification marked as read"))
}

/// Mark every unread notification for the account as read. Always succeeds;
/// a no-op when nothing is unread.
pub fn mark_all_read(db: &CrmDb, account_id: &str) -> Result<Ack, CrmError> {
    let changed = db.mark_all_notifications_read(account_id)?;
    log::debug!(
        "mark_all_read: {} notification(s) updated for account {}",
        changed,
        account_id
    );
    Ok(Ack::ok("All notifications marked as read"))
}

/// Count of unread notifications for the account.
pub fn unread_count(db: &CrmDb, account_id: &str) -> Result<i64, CrmError> {
    Ok(db.count_unread_notifications(account_id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_db;
    use crate::db::{NewNotification, NotificationPriority};

    fn seed(db: &CrmDb, account_id: &str, title: &str) -> String {
        db.insert_notification(&NewNotification {
            account_id: account_id.to_string(),
            title: title.to_string(),
            message: "m".to_string(),
            priority: NotificationPriority::High,
            action_url: None,
        })
        .expect("insert")
        .id
    }

    #[test]
    fn test_mark_read_then_count() {
        let db = test_db();
        let id = seed(&db, "acct-1", "One");
        seed(&db, "acct-1", "Two");

        let ack = mark_read(&db, "acct-1", &id).expect("mark");
        assert!(ack.success);
        assert_eq!(ack.message, "Notification marked as read");
        assert_eq!(unread_count(&db, "acct-1").expect("count"), 1);

        // Idempotent
        mark_read(&db, "acct-1", &id).expect("second mark");
        assert_eq!(unread_count(&db, "acct-1").expect("count"), 1);
    }

    #[test]
    fn test_mark_read_foreign_notification_not_found() {
        let db = test_db();
        let id = seed(&db, "acct-1", "Private");

        let err = mark_read(&db, "acct-2", &id).expect_err("foreign id");
        assert!(err.is_not_found());

        // The row's read state must be untouched
        let row = db
            .get_notification("acct-1", &id)
            .expect("get")
            .expect("exists");
        assert!(!row.is_read);

        let err = mark_read(&db, "acct-1", "no-such-id").expect_err("absent id");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_mark_all_read_yields_zero_unread() {
        let db = test_db();
        let read_id = seed(&db, "acct-1", "Already read");
        seed(&db, "acct-1", "Unread");
        mark_read(&db, "acct-1", &read_id).expect("pre-read");
        assert_eq!(unread_count(&db, "acct-1").expect("count"), 1);

        let ack = mark_all_read(&db, "acct-1").expect("mark all");
        assert!(ack.success);
        assert_eq!(unread_count(&db, "acct-1").expect("count"), 0);

        // Both rows report read
        let rows = db.recent_notifications("acct-1", 10).expect("list");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|n| n.is_read));

        // No-op when repeated
        let ack = mark_all_read(&db, "acct-1").expect("repeat");
        assert!(ack.success);
    }

    #[test]
    fn test_mark_all_read_scoped_to_account() {
        let db = test_db();
        seed(&db, "acct-1", "Mine");
        seed(&db, "acct-2", "Theirs");

        mark_all_read(&db, "acct-1").expect("mark all");
        assert_eq!(unread_count(&db, "acct-1").expect("count"), 0);
        assert_eq!(unread_count(&db, "acct-2").expect("count"), 1);
    }
}
