//! Shared type definitions for the database layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::helpers::relative_time;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Invalid record: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Choice enums
// ---------------------------------------------------------------------------
// Every enum stored as TEXT gets three mappings: `as_str` for SQL storage,
// `from_str_lossy` for reading rows back (unknown values fall to the column
// default), and `label` for the human-readable form shown on the dashboard.
// Adding a variant forces all three through the exhaustive match.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    M,
    F,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
            Gender::Other => "O",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "M" => Gender::M,
            "F" => Gender::F,
            _ => Gender::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::M => "Male",
            Gender::F => "Female",
            Gender::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    Individual,
    Business,
    Organization,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::Individual => "individual",
            CustomerType::Business => "business",
            CustomerType::Organization => "organization",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "business" => CustomerType::Business,
            "organization" => CustomerType::Organization,
            _ => CustomerType::Individual,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CustomerType::Individual => "Individual",
            CustomerType::Business => "Business",
            CustomerType::Organization => "Organization",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    Active,
    Inactive,
    Prospect,
    Lead,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Active => "active",
            CustomerStatus::Inactive => "inactive",
            CustomerStatus::Prospect => "prospect",
            CustomerStatus::Lead => "lead",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "active" => CustomerStatus::Active,
            "inactive" => CustomerStatus::Inactive,
            "lead" => CustomerStatus::Lead,
            _ => CustomerStatus::Prospect,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CustomerStatus::Active => "Active",
            CustomerStatus::Inactive => "Inactive",
            CustomerStatus::Prospect => "Prospect",
            CustomerStatus::Lead => "Lead",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "planning",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::OnHold => "on_hold",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "in_progress" => ProjectStatus::InProgress,
            "on_hold" => ProjectStatus::OnHold,
            "completed" => ProjectStatus::Completed,
            "cancelled" => ProjectStatus::Cancelled,
            _ => ProjectStatus::Planning,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "Planning",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::OnHold => "On Hold",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Cancelled => "Cancelled",
        }
    }

    /// Statuses counted as "active projects" on the dashboard.
    pub fn is_open(&self) -> bool {
        matches!(self, ProjectStatus::InProgress | ProjectStatus::Planning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "processing" => PaymentStatus::Processing,
            "completed" => PaymentStatus::Completed,
            "failed" => PaymentStatus::Failed,
            "cancelled" => PaymentStatus::Cancelled,
            "refunded" => PaymentStatus::Refunded,
            _ => PaymentStatus::Pending,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Processing => "Processing",
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Cancelled => "Cancelled",
            PaymentStatus::Refunded => "Refunded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Stripe,
    Mpesa,
    BankTransfer,
    Cash,
    Cheque,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::Mpesa => "mpesa",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Cheque => "cheque",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "stripe" => PaymentMethod::Stripe,
            "mpesa" => PaymentMethod::Mpesa,
            "bank_transfer" => PaymentMethod::BankTransfer,
            "cheque" => PaymentMethod::Cheque,
            _ => PaymentMethod::Cash,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Stripe => "Credit/Debit Card",
            PaymentMethod::Mpesa => "M-PESA",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Cheque => "Cheque",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    Basic,
    Pro,
    Enterprise,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Basic => "basic",
            SubscriptionPlan::Pro => "pro",
            SubscriptionPlan::Enterprise => "enterprise",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "pro" => SubscriptionPlan::Pro,
            "enterprise" => SubscriptionPlan::Enterprise,
            _ => SubscriptionPlan::Basic,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubscriptionPlan::Basic => "Basic",
            SubscriptionPlan::Pro => "Pro",
            SubscriptionPlan::Enterprise => "Enterprise",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Cancelled,
    Expired,
    Suspended,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Suspended => "suspended",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "inactive" => SubscriptionStatus::Inactive,
            "cancelled" => SubscriptionStatus::Cancelled,
            "expired" => SubscriptionStatus::Expired,
            "suspended" => SubscriptionStatus::Suspended,
            _ => SubscriptionStatus::Active,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "Active",
            SubscriptionStatus::Inactive => "Inactive",
            SubscriptionStatus::Cancelled => "Cancelled",
            SubscriptionStatus::Expired => "Expired",
            SubscriptionStatus::Suspended => "Suspended",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetType {
    Chart,
    Metric,
    Table,
    Map,
    Calendar,
    List,
}

impl WidgetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetType::Chart => "chart",
            WidgetType::Metric => "metric",
            WidgetType::Table => "table",
            WidgetType::Map => "map",
            WidgetType::Calendar => "calendar",
            WidgetType::List => "list",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "chart" => WidgetType::Chart,
            "table" => WidgetType::Table,
            "map" => WidgetType::Map,
            "calendar" => WidgetType::Calendar,
            "list" => WidgetType::List,
            _ => WidgetType::Metric,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WidgetType::Chart => "Chart",
            WidgetType::Metric => "Metric",
            WidgetType::Table => "Table",
            WidgetType::Map => "Map",
            WidgetType::Calendar => "Calendar",
            WidgetType::List => "List",
        }
    }
}

/// Notification priority. Display only — no behavioral effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Medium => "medium",
            NotificationPriority::High => "high",
            NotificationPriority::Critical => "critical",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "low" => NotificationPriority::Low,
            "high" => NotificationPriority::High,
            "critical" => NotificationPriority::Critical,
            _ => NotificationPriority::Medium,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "Low",
            NotificationPriority::Medium => "Medium",
            NotificationPriority::High => "High",
            NotificationPriority::Critical => "Critical",
        }
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `customers` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbCustomer {
    pub id: String,
    pub account_id: String,
    /// Human-readable identifier (`CUS` + 6 digits). Assigned at creation,
    /// never regenerated.
    pub customer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub gender: Option<Gender>,
    pub customer_type: CustomerType,
    pub status: CustomerStatus,
    pub address: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub country: String,
    pub postal_code: Option<String>,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub industry: Option<String>,
    pub notes: Option<String>,
    /// Comma-separated tags.
    pub tags: Option<String>,
    pub is_primary_contact: bool,
    pub created_at: String,
    pub updated_at: String,
    pub last_contacted: Option<String>,
}

impl DbCustomer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Input for creating a customer. Ids, `customer_id`, and timestamps are
/// generated by the store.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub account_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub gender: Option<Gender>,
    pub customer_type: Option<CustomerType>,
    pub status: Option<CustomerStatus>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub industry: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub is_primary_contact: bool,
}

/// A row from the `projects` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbProject {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub status: ProjectStatus,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub account_id: String,
    pub name: String,
    pub status: Option<ProjectStatus>,
    pub description: Option<String>,
}

/// A row from the `payments` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbPayment {
    pub id: String,
    pub account_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: PaymentMethod,
    /// Gateway reference. Unique across all accounts.
    pub reference: String,
    pub description: Option<String>,
    /// Opaque JSON blob attached by the payment gateway.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub account_id: String,
    pub amount: f64,
    pub currency: Option<String>,
    pub status: Option<PaymentStatus>,
    pub payment_method: PaymentMethod,
    pub reference: String,
    pub description: Option<String>,
    pub metadata: Option<String>,
}

/// A row from the `subscriptions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbSubscription {
    pub id: String,
    pub account_id: String,
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub amount: f64,
    pub currency: String,
    pub billing_cycle: String,
    pub start_date: String,
    pub end_date: String,
    pub auto_renew: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub account_id: String,
    pub plan: SubscriptionPlan,
    pub status: Option<SubscriptionStatus>,
    pub amount: f64,
    pub currency: Option<String>,
    pub billing_cycle: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub auto_renew: bool,
}

/// A row from the `dashboard_widgets` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbWidget {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub widget_type: WidgetType,
    pub description: Option<String>,
    /// Opaque widget configuration, stored as a JSON document.
    pub configuration: String,
    pub is_active: bool,
    pub position: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewWidget {
    pub account_id: String,
    pub name: String,
    pub widget_type: WidgetType,
    pub description: Option<String>,
    pub configuration: Option<String>,
    pub is_active: bool,
    pub position: i32,
}

/// A row from the `quick_actions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbQuickAction {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub icon: String,
    pub url: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub position: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewQuickAction {
    pub account_id: String,
    pub name: String,
    pub icon: String,
    pub url: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub position: i32,
}

/// A row from the `notifications` table.
///
/// Immutable after creation except for `is_read`, which only ever moves
/// unread → read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbNotification {
    pub id: String,
    pub account_id: String,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub is_read: bool,
    pub action_url: Option<String>,
    pub created_at: String,
}

impl DbNotification {
    /// Age of the notification in human-readable form ("2 hours ago").
    pub fn time_since_created(&self) -> String {
        relative_time(&self.created_at)
    }
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub account_id: String,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub action_url: Option<String>,
}

/// A row from the `system_stats` table — one snapshot per calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbSystemStats {
    /// Snapshot date, `YYYY-MM-DD`. Unique.
    pub date: String,
    pub total_customers: i64,
    pub total_projects: i64,
    pub total_revenue: f64,
    pub active_subscriptions: i64,
    pub new_customers_today: i64,
    pub projects_completed: i64,
    /// Completed payments as a percentage of all payments, 0–100.
    pub payment_success_rate: f64,
    pub average_response_time: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl DbSystemStats {
    /// An all-zero snapshot for `date`. Written when the dashboard is read
    /// before any recomputation has run.
    pub fn zero(date: &str, now: &str) -> Self {
        DbSystemStats {
            date: date.to_string(),
            total_customers: 0,
            total_projects: 0,
            total_revenue: 0.0,
            active_subscriptions: 0,
            new_customers_today: 0,
            projects_completed: 0,
            payment_success_rate: 0.0,
            average_response_time: 0.0,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }
}
