//! Composed view types returned by the dashboard, analytics, and
//! notification surfaces. All serialize as camelCase JSON; the web layer
//! passes them through to templates or API responses unchanged.

use serde::{Deserialize, Serialize};

use crate::db::{
    DbCustomer, DbNotification, DbPayment, DbProject, DbQuickAction, DbSystemStats, DbWidget,
    PaymentMethod, ProjectStatus, WidgetType,
};

/// Everything the main dashboard page needs, assembled in one pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub stats: DbSystemStats,
    pub widgets: Vec<DbWidget>,
    pub quick_actions: Vec<DbQuickAction>,
    /// Five most recent notifications, any read state.
    pub notifications: Vec<DbNotification>,
    /// Unread count over all of the account's notifications, not just the
    /// five shown.
    pub unread_count: i64,
    pub recent_customers: Vec<DbCustomer>,
    pub recent_projects: Vec<DbProject>,
    pub recent_payments: Vec<DbPayment>,
    /// New customers since the start of the current month.
    pub month_customers: i64,
    /// Completed payment volume since the start of the current month.
    pub month_revenue: f64,
    /// Projects currently in planning or in progress.
    pub active_projects: i64,
    pub generated_at: String,
}

/// The counters of the latest snapshot, trimmed for the JSON summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_customers: i64,
    pub total_projects: i64,
    pub total_revenue: f64,
    pub active_subscriptions: i64,
}

impl From<&DbSystemStats> for StatsSummary {
    fn from(stats: &DbSystemStats) -> Self {
        StatsSummary {
            total_customers: stats.total_customers,
            total_projects: stats.total_projects,
            total_revenue: stats.total_revenue,
            active_subscriptions: stats.active_subscriptions,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentCustomer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentProject {
    pub id: String,
    pub name: String,
    /// Display label, e.g. "In Progress".
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentPayment {
    pub id: String,
    pub amount: f64,
    /// Display label, e.g. "Completed".
    pub status: String,
    /// Display label, e.g. "M-PESA".
    pub method: String,
    pub created_at: String,
}

/// Machine-readable dashboard summary for the JSON endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub stats: StatsSummary,
    pub recent_customers: Vec<RecentCustomer>,
    pub recent_projects: Vec<RecentProject>,
    pub recent_payments: Vec<RecentPayment>,
    pub unread_notifications: i64,
    pub last_updated: String,
}

/// Descriptor returned for a single widget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetPayload {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    /// The widget's configuration blob, parsed.
    pub data: serde_json::Value,
    pub created_at: String,
}

/// One day bucket of a count series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCount {
    pub day: String,
    pub count: i64,
}

/// One day bucket of an amount series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTotal {
    pub day: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatusCount {
    pub status: ProjectStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodCount {
    pub payment_method: PaymentMethod,
    pub count: i64,
}

/// Time series and distributions for the analytics page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsView {
    /// Trailing window length in days.
    pub days: u32,
    /// New customers per calendar day, ascending, within the window.
    pub customers_over_time: Vec<DayCount>,
    /// Completed payment volume per calendar day, ascending, within the window.
    pub revenue_over_time: Vec<DayTotal>,
    /// Status frequency over all of the account's projects.
    pub project_status_dist: Vec<ProjectStatusCount>,
    /// Method frequency over all of the account's payments.
    pub payment_method_dist: Vec<PaymentMethodCount>,
}

/// `{success, message}` body returned by the notification mutation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

impl Ack {
    pub fn ok(message: impl Into<String>) -> Self {
        Ack {
            success: true,
            message: message.into(),
        }
    }
}
