//! Database models.
//!
//! Row types derive [`FromRow`] and serialize with camelCase field names, which
//! is the shape the web API exposes. Draft types carry the writable fields for
//! inserts and updates.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Account role. Admin routes require `Admin` or `MasterAdmin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
    MasterAdmin,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::MasterAdmin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
            UserRole::MasterAdmin => "master_admin",
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Unique, compared case-insensitively.
    pub email: String,
    /// Argon2 PHC string. Never leaves the server.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Fields needed to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub trial_ends_at: Option<DateTime<Utc>>,
}

/// A login session keyed by an opaque cookie token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Pipeline stage of a client record.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ClientStatus {
    #[default]
    Prospect,
    Lead,
    Active,
    Client,
    Inactive,
    Archived,
}

/// Priority shared by clients and follow-ups.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// A client record owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: ClientStatus,
    pub priority: Priority,
    pub category: Option<String>,
    pub source: Option<String>,
    #[sqlx(json)]
    pub tags: BTreeSet<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writable client fields, used for both create and full update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDraft {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub status: ClientStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Kind of contact event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum InteractionType {
    Call,
    Email,
    Meeting,
    Message,
}

/// An append-only contact log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: i64,
    pub client_id: i64,
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to log an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionDraft {
    pub client_id: i64,
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    #[serde(default)]
    pub notes: String,
}

/// Stored follow-up status.
///
/// `Overdue` can be stored, but reminder derivation always recomputes
/// overdue-ness from the due date.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum FollowUpStatus {
    #[default]
    Pending,
    Completed,
    Overdue,
}

/// A scheduled task tied to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
    pub id: i64,
    pub client_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub status: FollowUpStatus,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Writable follow-up fields, used for both create and full update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpDraft {
    pub client_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub status: FollowUpStatus,
    #[serde(default)]
    pub priority: Priority,
}

/// The seven kinds of admin-facing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum NotificationType {
    UserRegistration,
    UserLogin,
    RoleChange,
    TrialStarted,
    TrialExpiring,
    TrialExpired,
    SystemAlert,
}

/// Severity of an admin notification.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// A durable admin notification with read state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminNotification {
    pub id: i64,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub priority: NotificationPriority,
    pub is_read: bool,
    pub data: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to record an admin notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub priority: NotificationPriority,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl NotificationDraft {
    pub fn new(
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        priority: NotificationPriority,
    ) -> Self {
        Self {
            notification_type,
            title: title.into(),
            message: message.into(),
            priority,
            user_id: None,
            user_name: None,
            user_email: None,
            data: None,
        }
    }

    /// Attach the user the event is about.
    pub fn about(mut self, user: &User) -> Self {
        self.user_id = Some(user.id);
        self.user_name = Some(user.name.clone());
        self.user_email = Some(user.email.clone());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Coarse progress stage derived from level.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum JourneyStage {
    #[default]
    Onboarding,
    Exploring,
    Active,
    PowerUser,
    Expert,
}

/// Grouping for milestones in the journey view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum MilestoneCategory {
    GettingStarted,
    Clients,
    FollowUps,
    Communication,
    Insights,
}

/// Every milestone a user can complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum MilestoneKind {
    AccountCreated,
    FirstClient,
    FirstFollowUp,
    FirstInteraction,
    FirstEmail,
    FollowUpCompleted,
    TenClients,
    FirstExport,
}

/// Per-user points, level and stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JourneyProgress {
    pub user_id: i64,
    pub total_points: i64,
    pub completed_milestones: i64,
    pub current_level: i64,
    pub journey_stage: JourneyStage,
    pub last_activity_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One milestone row for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JourneyMilestone {
    pub id: i64,
    pub user_id: i64,
    pub milestone_type: MilestoneKind,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub points: i64,
    pub category: MilestoneCategory,
    pub created_at: DateTime<Utc>,
}
