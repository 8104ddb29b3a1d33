use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use super::*;

impl CrmDb {
    /// Helper: map a row to `DbSubscription`.
    pub(crate) fn map_subscription_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbSubscription> {
        Ok(DbSubscription {
            id: row.get(0)?,
            account_id: row.get(1)?,
            plan: SubscriptionPlan::from_str_lossy(&row.get::<_, String>(2)?),
            status: SubscriptionStatus::from_str_lossy(&row.get::<_, String>(3)?),
            amount: row.get(4)?,
            currency: row.get(5)?,
            billing_cycle: row.get(6)?,
            start_date: row.get(7)?,
            end_date: row.get(8)?,
            auto_renew: row.get::<_, i32>(9)? != 0,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    /// Create a subscription.
    pub fn create_subscription(&self, input: &NewSubscription) -> Result<DbSubscription, DbError> {
        let now = Utc::now().to_rfc3339();
        let subscription = DbSubscription {
            id: Uuid::new_v4().to_string(),
            account_id: input.account_id.clone(),
            plan: input.plan,
            status: input.status.unwrap_or(SubscriptionStatus::Active),
            amount: input.amount,
            currency: input.currency.clone().unwrap_or_else(|| "KES".to_string()),
            billing_cycle: input
                .billing_cycle
                .clone()
                .unwrap_or_else(|| "monthly".to_string()),
            start_date: input.start_date.clone(),
            end_date: input.end_date.clone(),
            auto_renew: input.auto_renew,
            created_at: now.clone(),
            updated_at: now,
        };
        self.conn.execute(
            "INSERT INTO subscriptions (id, account_id, plan, status, amount, currency,
                billing_cycle, start_date, end_date, auto_renew, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                subscription.id,
                subscription.account_id,
                subscription.plan.as_str(),
                subscription.status.as_str(),
                subscription.amount,
                subscription.currency,
                subscription.billing_cycle,
                subscription.start_date,
                subscription.end_date,
                subscription.auto_renew as i32,
                subscription.created_at,
                subscription.updated_at,
            ],
        )?;
        Ok(subscription)
    }

    /// Get a subscription by id, scoped to the owning account.
    pub fn get_subscription(
        &self,
        account_id: &str,
        id: &str,
    ) -> Result<Option<DbSubscription>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, account_id, plan, status, amount, currency, billing_cycle,
                    start_date, end_date, auto_renew, created_at, updated_at
             FROM subscriptions WHERE id = ?1 AND account_id = ?2",
        )?;
        let mut rows = stmt.query_map(params![id, account_id], Self::map_subscription_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Active subscriptions across all accounts. Snapshot recomputation only.
    pub fn count_active_subscriptions(&self) -> Result<i64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM subscriptions WHERE status = 'active'",
            [],
            |row| row.get(0),
        )?)
    }
}
