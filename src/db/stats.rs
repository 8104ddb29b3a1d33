use rusqlite::params;

use super::*;

const STATS_COLUMNS: &str = "date, total_customers, total_projects, total_revenue,
        active_subscriptions, new_customers_today, projects_completed,
        payment_success_rate, average_response_time, created_at, updated_at";

impl CrmDb {
    /// Helper: map a row to `DbSystemStats`. Column order must match
    /// `STATS_COLUMNS`.
    pub(crate) fn map_stats_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbSystemStats> {
        Ok(DbSystemStats {
            date: row.get(0)?,
            total_customers: row.get(1)?,
            total_projects: row.get(2)?,
            total_revenue: row.get(3)?,
            active_subscriptions: row.get(4)?,
            new_customers_today: row.get(5)?,
            projects_completed: row.get(6)?,
            payment_success_rate: row.get(7)?,
            average_response_time: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    /// The most recent snapshot by date, if any.
    pub fn latest_stats_snapshot(&self) -> Result<Option<DbSystemStats>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STATS_COLUMNS} FROM system_stats ORDER BY date DESC LIMIT 1"
        ))?;
        let mut rows = stmt.query_map([], Self::map_stats_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// The snapshot for a specific date, if any.
    pub fn get_stats_snapshot(&self, date: &str) -> Result<Option<DbSystemStats>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STATS_COLUMNS} FROM system_stats WHERE date = ?1"
        ))?;
        let mut rows = stmt.query_map(params![date], Self::map_stats_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Insert an all-zero snapshot for `date` if none exists. Concurrent
    /// first-access callers race benignly: the date PRIMARY KEY plus
    /// DO NOTHING makes the insert idempotent.
    pub fn insert_zero_stats_snapshot(&self, snapshot: &DbSystemStats) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO system_stats (date, total_customers, total_projects,
                total_revenue, active_subscriptions, new_customers_today,
                projects_completed, payment_success_rate, average_response_time,
                created_at, updated_at)
             VALUES (?1, 0, 0, 0, 0, 0, 0, 0, 0, ?2, ?3)
             ON CONFLICT(date) DO NOTHING",
            params![snapshot.date, snapshot.created_at, snapshot.updated_at],
        )?;
        Ok(())
    }

    /// Write a recomputed snapshot, replacing any existing row for its date.
    pub fn upsert_stats_snapshot(&self, snapshot: &DbSystemStats) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO system_stats (date, total_customers, total_projects,
                total_revenue, active_subscriptions, new_customers_today,
                projects_completed, payment_success_rate, average_response_time,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(date) DO UPDATE SET
                total_customers = excluded.total_customers,
                total_projects = excluded.total_projects,
                total_revenue = excluded.total_revenue,
                active_subscriptions = excluded.active_subscriptions,
                new_customers_today = excluded.new_customers_today,
                projects_completed = excluded.projects_completed,
                payment_success_rate = excluded.payment_success_rate,
                average_response_time = excluded.average_response_time,
                updated_at = excluded.updated_at",
            params![
                snapshot.date,
                snapshot.total_customers,
                snapshot.total_projects,
                snapshot.total_revenue,
                snapshot.active_subscriptions,
                snapshot.new_customers_today,
                snapshot.projects_completed,
                snapshot.payment_success_rate,
                snapshot.average_response_time,
                snapshot.created_at,
                snapshot.updated_at,
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::test_db;
    use super::*;

    #[test]
    fn test_latest_snapshot_orders_by_date() {
        let db = test_db();
        assert!(db.latest_stats_snapshot().expect("query").is_none());

        for date in ["2026-01-01", "2026-03-01", "2026-02-01"] {
            let snap = DbSystemStats::zero(date, "2026-03-01T00:00:00+00:00");
            db.upsert_stats_snapshot(&snap).expect("upsert");
        }

        let latest = db
            .latest_stats_snapshot()
            .expect("query")
            .expect("exists");
        assert_eq!(latest.date, "2026-03-01");
    }

    #[test]
    fn test_zero_insert_is_idempotent_and_preserves_existing() {
        let db = test_db();
        let mut real = DbSystemStats::zero("2026-05-01", "x");
        real.total_customers = 42;
        db.upsert_stats_snapshot(&real).expect("upsert");

        // A racing first-access insert must not clobber the recomputed row
        let zero = DbSystemStats::zero("2026-05-01", "y");
        db.insert_zero_stats_snapshot(&zero).expect("insert");
        db.insert_zero_stats_snapshot(&zero).expect("second insert");

        let kept = db
            .get_stats_snapshot("2026-05-01")
            .expect("query")
            .expect("exists");
        assert_eq!(kept.total_customers, 42);
    }

    #[test]
    fn test_upsert_replaces_counters() {
        let db = test_db();
        let mut snap = DbSystemStats::zero("2026-06-01", "x");
        db.upsert_stats_snapshot(&snap).expect("first");

        snap.total_revenue = 125_000.0;
        snap.payment_success_rate = 87.5;
        db.upsert_stats_snapshot(&snap).expect("second");

        let stored = db
            .get_stats_snapshot("2026-06-01")
            .expect("query")
            .expect("exists");
        assert_eq!(stored.total_revenue, 125_000.0);
        assert_eq!(stored.payment_success_rate, 87.5);
    }
}
