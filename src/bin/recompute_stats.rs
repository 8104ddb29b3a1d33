//! On-demand snapshot recomputation.
//!
//! Recomputes the `system_stats` row for today (or a date passed as the
//! first argument, `YYYY-MM-DD`) and exits. Scheduling is left to cron or
//! the host application.
//!
//! Usage: `datalink-recompute [date]`

use std::process::ExitCode;

use datalink::db::CrmDb;
use datalink::helpers::today_utc;
use datalink::stats::recompute_stats;

fn main() -> ExitCode {
    env_logger::init();

    let date = std::env::args().nth(1).unwrap_or_else(today_utc);

    let db = match CrmDb::open() {
        Ok(db) => db,
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match recompute_stats(&db, &date) {
        Ok(snapshot) => {
            println!(
                "Recomputed stats for {}: {} customers, {} projects, {:.2} revenue, \
                 {} active subscriptions, {:.1}% payment success",
                snapshot.date,
                snapshot.total_customers,
                snapshot.total_projects,
                snapshot.total_revenue,
                snapshot.active_subscriptions,
                snapshot.payment_success_rate,
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Recompute failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
