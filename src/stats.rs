//! Metrics aggregator.
//!
//! One `system_stats` row per calendar date, covering all accounts. Reads
//! never fail with NotFound: the first dashboard hit on an empty store
//! writes an all-zero row for today and returns it. Recomputation is
//! on-demand (see the `datalink-recompute` binary); nothing here schedules
//! it.

use chrono::{NaiveDate, Utc};

use crate::db::{CrmDb, DbSystemStats};
use crate::error::CrmError;
use crate::helpers::today_utc;

/// The most recent snapshot, creating today's zero-valued row if the table
/// is empty.
///
/// Concurrent first-access callers are safe: the insert is
/// conflict-do-nothing on the date key, and the winner's row is re-read.
pub fn latest_stats(db: &CrmDb) -> Result<DbSystemStats, CrmError> {
    if let Some(snapshot) = db.latest_stats_snapshot()? {
        return Ok(snapshot);
    }

    let today = today_utc();
    let now = Utc::now().to_rfc3339();
    let zero = DbSystemStats::zero(&today, &now);
    db.insert_zero_stats_snapshot(&zero)?;
    log::info!("No stats snapshot found; seeded zero snapshot for {}", today);

    Ok(db.get_stats_snapshot(&today)?.unwrap_or(zero))
}

/// Recompute the snapshot for `date` from the record store and upsert it.
///
/// Counters span all accounts. `average_response_time` has no source in the
/// record store; an existing value is carried forward rather than zeroed.
pub fn recompute_stats(db: &CrmDb, date: &str) -> Result<DbSystemStats, CrmError> {
    if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        return Err(CrmError::Validation(format!(
            "'{}' is not a valid date (expected YYYY-MM-DD)",
            date
        )));
    }

    let existing = db.get_stats_snapshot(date)?;
    let now = Utc::now().to_rfc3339();

    let snapshot = DbSystemStats {
        date: date.to_string(),
        total_customers: db.count_customers()?,
        total_projects: db.count_projects()?,
        total_revenue: db.sum_completed_payments()?,
        active_subscriptions: db.count_active_subscriptions()?,
        new_customers_today: db.count_customers_created_on(date)?,
        projects_completed: db.count_completed_projects()?,
        payment_success_rate: db.payment_success_rate()?,
        average_response_time: existing
            .as_ref()
            .map(|s| s.average_response_time)
            .unwrap_or(0.0),
        created_at: existing
            .as_ref()
            .map(|s| s.created_at.clone())
            .unwrap_or_else(|| now.clone()),
        updated_at: now,
    };

    db.upsert_stats_snapshot(&snapshot)?;
    log::info!(
        "Recomputed stats for {}: {} customers, {} projects, {:.2} revenue",
        date,
        snapshot.total_customers,
        snapshot.total_projects,
        snapshot.total_revenue
    );

    Ok(snapshot)
}
