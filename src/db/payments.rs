use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use super::*;

const PAYMENT_COLUMNS: &str = "id, account_id, amount, currency, status, payment_method,
        reference, description, metadata, created_at, updated_at, completed_at";

impl CrmDb {
    /// Helper: map a row to `DbPayment`. Column order must match
    /// `PAYMENT_COLUMNS`.
    pub(crate) fn map_payment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbPayment> {
        Ok(DbPayment {
            id: row.get(0)?,
            account_id: row.get(1)?,
            amount: row.get(2)?,
            currency: row.get(3)?,
            status: PaymentStatus::from_str_lossy(&row.get::<_, String>(4)?),
            payment_method: PaymentMethod::from_str_lossy(&row.get::<_, String>(5)?),
            reference: row.get(6)?,
            description: row.get(7)?,
            metadata: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
            completed_at: row.get(11)?,
        })
    }

    /// Create a payment. The gateway reference must be unique.
    pub fn create_payment(&self, input: &NewPayment) -> Result<DbPayment, DbError> {
        if input.amount <= 0.0 {
            return Err(DbError::Invalid(
                "Payment amount must be positive".to_string(),
            ));
        }
        if let Some(meta) = &input.metadata {
            if serde_json::from_str::<serde_json::Value>(meta).is_err() {
                return Err(DbError::Invalid(
                    "Payment metadata must be valid JSON".to_string(),
                ));
            }
        }

        let now = Utc::now().to_rfc3339();
        let payment = DbPayment {
            id: Uuid::new_v4().to_string(),
            account_id: input.account_id.clone(),
            amount: input.amount,
            currency: input.currency.clone().unwrap_or_else(|| "KES".to_string()),
            status: input.status.unwrap_or(PaymentStatus::Pending),
            payment_method: input.payment_method,
            reference: input.reference.clone(),
            description: input.description.clone(),
            metadata: input.metadata.clone(),
            created_at: now.clone(),
            updated_at: now,
            completed_at: None,
        };
        self.conn.execute(
            "INSERT INTO payments (id, account_id, amount, currency, status,
                payment_method, reference, description, metadata,
                created_at, updated_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                payment.id,
                payment.account_id,
                payment.amount,
                payment.currency,
                payment.status.as_str(),
                payment.payment_method.as_str(),
                payment.reference,
                payment.description,
                payment.metadata,
                payment.created_at,
                payment.updated_at,
                payment.completed_at,
            ],
        )?;
        Ok(payment)
    }

    /// Get a payment by id, scoped to the owning account.
    pub fn get_payment(&self, account_id: &str, id: &str) -> Result<Option<DbPayment>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1 AND account_id = ?2"
        ))?;
        let mut rows = stmt.query_map(params![id, account_id], Self::map_payment_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Mark a payment completed, stamping completed_at.
    /// Returns false when no matching payment exists for the account.
    pub fn complete_payment(&self, account_id: &str, id: &str) -> Result<bool, DbError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE payments SET status = 'completed', completed_at = ?1, updated_at = ?1
             WHERE id = ?2 AND account_id = ?3",
            params![now, id, account_id],
        )?;
        Ok(changed > 0)
    }

    /// Most recently created payments for an account, newest first.
    pub fn recent_payments(&self, account_id: &str, limit: i64) -> Result<Vec<DbPayment>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments
             WHERE account_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![account_id, limit], Self::map_payment_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Sum of an account's completed payments created at or after `since`.
    pub fn sum_completed_payments_since(
        &self,
        account_id: &str,
        since: &str,
    ) -> Result<f64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM payments
             WHERE account_id = ?1 AND status = 'completed' AND created_at >= ?2",
            params![account_id, since],
            |row| row.get(0),
        )?)
    }

    /// (created_at, amount) pairs of an account's completed payments since
    /// `since`. Feeds the analytics revenue series.
    pub fn completed_payments_since(
        &self,
        account_id: &str,
        since: &str,
    ) -> Result<Vec<(String, f64)>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT created_at, amount FROM payments
             WHERE account_id = ?1 AND status = 'completed' AND created_at >= ?2
             ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![account_id, since], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Frequency of each payment method for an account.
    pub fn payment_method_distribution(
        &self,
        account_id: &str,
    ) -> Result<Vec<(PaymentMethod, i64)>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT payment_method, COUNT(*) FROM payments
             WHERE account_id = ?1
             GROUP BY payment_method
             ORDER BY payment_method",
        )?;
        let rows = stmt.query_map(params![account_id], |row| {
            Ok((
                PaymentMethod::from_str_lossy(&row.get::<_, String>(0)?),
                row.get::<_, i64>(1)?,
            ))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Sum of completed payments across all accounts. Snapshot recomputation
    /// only.
    pub fn sum_completed_payments(&self) -> Result<f64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE status = 'completed'",
            [],
            |row| row.get(0),
        )?)
    }

    /// Completed payments as a percentage of all payments, across all
    /// accounts. 0.0 when there are no payments. Snapshot recomputation only.
    pub fn payment_success_rate(&self) -> Result<f64, DbError> {
        let (completed, total): (i64, i64) = self.conn.query_row(
            "SELECT COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0),
                    COUNT(*)
             FROM payments",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        if total == 0 {
            return Ok(0.0);
        }
        Ok(completed as f64 / total as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::test_db;
    use super::*;

    fn sample_payment(account_id: &str, reference: &str, amount: f64) -> NewPayment {
        NewPayment {
            account_id: account_id.to_string(),
            amount,
            currency: None,
            status: None,
            payment_method: PaymentMethod::Mpesa,
            reference: reference.to_string(),
            description: None,
            metadata: None,
        }
    }

    #[test]
    fn test_create_defaults() {
        let db = test_db();
        let payment = db
            .create_payment(&sample_payment("acct-1", "MPESA-001", 1500.0))
            .expect("create");
        assert_eq!(payment.currency, "KES");
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.completed_at.is_none());
    }

    #[test]
    fn test_create_rejects_nonpositive_amount() {
        let db = test_db();
        let err = db
            .create_payment(&sample_payment("acct-1", "REF-1", 0.0))
            .expect_err("zero amount");
        assert!(matches!(err, DbError::Invalid(_)));
        assert!(db
            .create_payment(&sample_payment("acct-1", "REF-2", -10.0))
            .is_err());
    }

    #[test]
    fn test_create_rejects_bad_metadata() {
        let db = test_db();
        let mut input = sample_payment("acct-1", "REF-3", 10.0);
        input.metadata = Some("{not json".to_string());
        assert!(db.create_payment(&input).is_err());
    }

    #[test]
    fn test_duplicate_reference_rejected() {
        let db = test_db();
        db.create_payment(&sample_payment("acct-1", "REF-DUP", 10.0))
            .expect("first");
        let dup = db.create_payment(&sample_payment("acct-2", "REF-DUP", 20.0));
        assert!(dup.is_err(), "reference is unique across accounts");
    }

    #[test]
    fn test_complete_payment_scoped() {
        let db = test_db();
        let payment = db
            .create_payment(&sample_payment("acct-1", "REF-C", 10.0))
            .expect("create");

        assert!(!db.complete_payment("acct-2", &payment.id).expect("update"));
        assert!(db.complete_payment("acct-1", &payment.id).expect("update"));

        let fetched = db
            .get_payment("acct-1", &payment.id)
            .expect("get")
            .expect("exists");
        assert_eq!(fetched.status, PaymentStatus::Completed);
        assert!(fetched.completed_at.is_some());
    }

    #[test]
    fn test_sum_completed_since_ignores_other_statuses_and_accounts() {
        let db = test_db();
        let p1 = db
            .create_payment(&sample_payment("acct-1", "R1", 100.0))
            .expect("create");
        db.complete_payment("acct-1", &p1.id).expect("complete");

        // Pending — not counted
        db.create_payment(&sample_payment("acct-1", "R2", 50.0))
            .expect("create");

        // Other account — not counted
        let p3 = db
            .create_payment(&sample_payment("acct-2", "R3", 70.0))
            .expect("create");
        db.complete_payment("acct-2", &p3.id).expect("complete");

        let total = db
            .sum_completed_payments_since("acct-1", "2020-01-01T00:00:00+00:00")
            .expect("sum");
        assert_eq!(total, 100.0);
    }

    #[test]
    fn test_success_rate() {
        let db = test_db();
        assert_eq!(db.payment_success_rate().expect("rate"), 0.0);

        let p1 = db
            .create_payment(&sample_payment("acct-1", "S1", 10.0))
            .expect("create");
        db.complete_payment("acct-1", &p1.id).expect("complete");
        db.create_payment(&sample_payment("acct-1", "S2", 10.0))
            .expect("create");

        let rate = db.payment_success_rate().expect("rate");
        assert!((rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_method_distribution() {
        let db = test_db();
        db.create_payment(&sample_payment("acct-1", "M1", 10.0))
            .expect("create");
        let mut stripe = sample_payment("acct-1", "M2", 10.0);
        stripe.payment_method = PaymentMethod::Stripe;
        db.create_payment(&stripe).expect("create");
        let mut stripe2 = sample_payment("acct-1", "M3", 10.0);
        stripe2.payment_method = PaymentMethod::Stripe;
        db.create_payment(&stripe2).expect("create");

        let dist = db.payment_method_distribution("acct-1").expect("dist");
        assert!(dist.contains(&(PaymentMethod::Mpesa, 1)));
        assert!(dist.contains(&(PaymentMethod::Stripe, 2)));
    }
}
