//! Dashboard composer.
//!
//! Assembles the personalized dashboard, the machine-readable summary, the
//! per-widget descriptor, and the analytics series. Everything is read in
//! one synchronous pass per request; the only write anywhere on these paths
//! is the lazy zero-snapshot seed in [`crate::stats::latest_stats`].

use std::collections::BTreeMap;

use chrono::Utc;

use crate::config::SiteConfig;
use crate::db::CrmDb;
use crate::error::CrmError;
use crate::helpers::{local_day, month_start, window_start};
use crate::stats::latest_stats;
use crate::types::{
    AnalyticsView, DashboardData, DashboardView, DayCount, DayTotal, PaymentMethodCount,
    ProjectStatusCount, RecentCustomer, RecentPayment, RecentProject, StatsSummary, WidgetPayload,
};

/// Recent-record cap on the rendered dashboard.
const RECENT_DASHBOARD: i64 = 5;
/// Recent-record cap on the JSON summary.
const RECENT_API: i64 = 10;
/// Quick-action cap on the rendered dashboard.
const QUICK_ACTIONS_CAP: i64 = 8;

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
const MAX_WINDOW_DAYS: u32 = 365;

/// Parse the `days` query parameter for the analytics view.
/// Absent or empty means the default window; anything that isn't an integer
/// in 1..=365 is rejected.
pub fn parse_window_days(raw: Option<&str>) -> Result<u32, CrmError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_WINDOW_DAYS);
    };
    let days: u32 = raw
        .parse()
        .map_err(|_| CrmError::Validation(format!("'{}' is not a valid day count", raw)))?;
    if days == 0 || days > MAX_WINDOW_DAYS {
        return Err(CrmError::Validation(format!(
            "Day count must be between 1 and {}",
            MAX_WINDOW_DAYS
        )));
    }
    Ok(days)
}

/// Build the main dashboard view for an account.
pub fn compose_dashboard(
    db: &CrmDb,
    config: &SiteConfig,
    account_id: &str,
) -> Result<DashboardView, CrmError> {
    let now = Utc::now();
    let stats = latest_stats(db)?;

    let widgets = db.active_widgets(account_id)?;
    let quick_actions = db.active_quick_actions(account_id, QUICK_ACTIONS_CAP)?;
    let notifications = db.recent_notifications(account_id, RECENT_DASHBOARD)?;
    let unread_count = db.count_unread_notifications(account_id)?;

    let recent_customers = db.recent_customers(account_id, RECENT_DASHBOARD)?;
    let recent_projects = db.recent_projects(account_id, RECENT_DASHBOARD)?;
    let recent_payments = db.recent_payments(account_id, RECENT_DASHBOARD)?;

    let since = month_start(now, config.tz());
    let month_customers = db.count_customers_since(account_id, &since)?;
    let month_revenue = db.sum_completed_payments_since(account_id, &since)?;
    let active_projects = db.count_open_projects(account_id)?;

    Ok(DashboardView {
        stats,
        widgets,
        quick_actions,
        notifications,
        unread_count,
        recent_customers,
        recent_projects,
        recent_payments,
        month_customers,
        month_revenue,
        active_projects,
        generated_at: now.to_rfc3339(),
    })
}

/// Build the machine-readable dashboard summary.
pub fn dashboard_data(db: &CrmDb, account_id: &str) -> Result<DashboardData, CrmError> {
    let stats = latest_stats(db)?;

    let recent_customers = db
        .recent_customers(account_id, RECENT_API)?
        .into_iter()
        .map(|c| RecentCustomer {
            name: c.full_name(),
            id: c.id,
            email: c.email,
            created_at: c.created_at,
        })
        .collect();

    let recent_projects = db
        .recent_projects(account_id, RECENT_API)?
        .into_iter()
        .map(|p| RecentProject {
            id: p.id,
            name: p.name,
            status: p.status.label().to_string(),
            created_at: p.created_at,
        })
        .collect();

    let recent_payments = db
        .recent_payments(account_id, RECENT_API)?
        .into_iter()
        .map(|p| RecentPayment {
            id: p.id,
            amount: p.amount,
            status: p.status.label().to_string(),
            method: p.payment_method.label().to_string(),
            created_at: p.created_at,
        })
        .collect();

    Ok(DashboardData {
        stats: StatsSummary::from(&stats),
        recent_customers,
        recent_projects,
        recent_payments,
        unread_notifications: db.count_unread_notifications(account_id)?,
        last_updated: Utc::now().to_rfc3339(),
    })
}

/// Descriptor for a single widget. NotFound when the widget is absent or
/// owned by another account.
pub fn widget_payload(
    db: &CrmDb,
    account_id: &str,
    widget_id: &str,
) -> Result<WidgetPayload, CrmError> {
    let widget = db
        .get_widget(account_id, widget_id)?
        .ok_or_else(|| CrmError::not_found("Widget"))?;

    // Configuration is validated at write time; tolerate anything that
    // slipped past by falling back to an empty object.
    let data = serde_json::from_str(&widget.configuration)
        .unwrap_or_else(|_| serde_json::Value::Object(Default::default()));

    Ok(WidgetPayload {
        id: widget.id,
        name: widget.name,
        widget_type: widget.widget_type,
        data,
        created_at: widget.created_at,
    })
}

/// Build the analytics series for a trailing window of `window_days` days.
///
/// Day buckets are calendar dates in the configured timezone. The two
/// distributions intentionally cover all of the account's records, not just
/// the window.
pub fn analytics(
    db: &CrmDb,
    config: &SiteConfig,
    account_id: &str,
    window_days: u32,
) -> Result<AnalyticsView, CrmError> {
    let tz = config.tz();
    let since = window_start(Utc::now(), window_days, tz);

    let mut customer_days: BTreeMap<String, i64> = BTreeMap::new();
    for created_at in db.customer_created_times_since(account_id, &since)? {
        if let Some(day) = local_day(&created_at, tz) {
            *customer_days.entry(day).or_insert(0) += 1;
        }
    }

    let mut revenue_days: BTreeMap<String, f64> = BTreeMap::new();
    for (created_at, amount) in db.completed_payments_since(account_id, &since)? {
        if let Some(day) = local_day(&created_at, tz) {
            *revenue_days.entry(day).or_insert(0.0) += amount;
        }
    }

    let project_status_dist = db
        .project_status_distribution(account_id)?
        .into_iter()
        .map(|(status, count)| ProjectStatusCount { status, count })
        .collect();

    let payment_method_dist = db
        .payment_method_distribution(account_id)?
        .into_iter()
        .map(|(payment_method, count)| PaymentMethodCount {
            payment_method,
            count,
        })
        .collect();

    Ok(AnalyticsView {
        days: window_days,
        customers_over_time: customer_days
            .into_iter()
            .map(|(day, count)| DayCount { day, count })
            .collect(),
        revenue_over_time: revenue_days
            .into_iter()
            .map(|(day, total)| DayTotal { day, total })
            .collect(),
        project_status_dist,
        payment_method_dist,
    })
}
