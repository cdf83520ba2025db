//! Admin console routes: notification inbox and user management.
//!
//! All routes require an admin session. Changing roles requires
//! `master_admin`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use database::{
    admin_notification, user, AdminNotification, NotificationDraft, NotificationType, User,
    UserRole,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::AdminUser;
use crate::error::{ApiError, Result};
use crate::events;
use crate::state::AppState;

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 500;

/// How a notification is drawn in the admin inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotificationStyle {
    pub color: &'static str,
    pub icon: &'static str,
}

/// Presentation for each notification type.
pub fn style_for(kind: NotificationType) -> NotificationStyle {
    let (color, icon) = match kind {
        NotificationType::UserRegistration => ("green", "user-plus"),
        NotificationType::UserLogin => ("blue", "log-in"),
        NotificationType::RoleChange => ("purple", "shield"),
        NotificationType::TrialStarted => ("teal", "play-circle"),
        NotificationType::TrialExpiring => ("orange", "clock"),
        NotificationType::TrialExpired => ("red", "alert-circle"),
        NotificationType::SystemAlert => ("red", "alert-triangle"),
    };
    NotificationStyle { color, icon }
}

/// A stored notification with its presentation.
#[derive(Serialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: AdminNotification,
    #[serde(flatten)]
    pub style: NotificationStyle,
}

impl From<AdminNotification> for NotificationView {
    fn from(notification: AdminNotification) -> Self {
        let style = style_for(notification.notification_type);
        Self {
            notification,
            style,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[derive(Serialize)]
pub struct MarkAllRead {
    pub updated: u64,
}

#[derive(Deserialize)]
pub struct RoleRequest {
    pub role: UserRole,
}

/// List notifications, newest first.
///
/// Due trial notifications are recorded before the list is read.
pub async fn list_notifications(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<NotificationView>>> {
    if let Err(e) = events::sweep_trials(&state, Utc::now()).await {
        warn!(error = %e, "Trial sweep failed");
    }

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let notifications =
        admin_notification::list_notifications(state.db.pool(), query.unread_only, limit).await?;

    Ok(Json(notifications.into_iter().map(Into::into).collect()))
}

/// Record a notification by hand, e.g. a system alert.
pub async fn create_notification(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(draft): Json<NotificationDraft>,
) -> Result<(StatusCode, Json<NotificationView>)> {
    let notification =
        admin_notification::create_notification(state.db.pool(), &draft, Utc::now()).await?;
    info!(admin_id = admin.id, id = notification.id, "Admin notification created");
    Ok((StatusCode::CREATED, Json(notification.into())))
}

pub async fn unread_count(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<UnreadCount>> {
    let count = admin_notification::unread_count(state.db.pool()).await?;
    Ok(Json(UnreadCount { count }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    admin_notification::mark_read(state.db.pool(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<MarkAllRead>> {
    let updated = admin_notification::mark_all_read(state.db.pool()).await?;
    Ok(Json(MarkAllRead { updated }))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    admin_notification::delete_notification(state.db.pool(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<User>>> {
    let users = user::list_users(state.db.pool()).await?;
    Ok(Json(users))
}

/// Change another user's role.
pub async fn change_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<RoleRequest>,
) -> Result<Json<User>> {
    if admin.role != UserRole::MasterAdmin {
        return Err(ApiError::Forbidden);
    }
    if admin.id == id {
        return Err(ApiError::BadRequest(
            "You cannot change your own role".to_string(),
        ));
    }

    let pool = state.db.pool();
    let previous = user::get_user(pool, id).await?.role;
    let updated = user::update_role(pool, id, req.role).await?;

    if previous != updated.role {
        info!(
            admin_id = admin.id,
            user_id = id,
            role = updated.role.as_str(),
            "Role changed"
        );
        events::role_changed(&state, &updated, previous, &admin).await;
    }

    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_types_are_red() {
        assert_eq!(style_for(NotificationType::TrialExpired).color, "red");
        assert_eq!(style_for(NotificationType::SystemAlert).icon, "alert-triangle");
        assert_eq!(style_for(NotificationType::UserLogin).color, "blue");
    }
}
