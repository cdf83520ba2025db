//! Admin notification store.
//!
//! Rows are created by server-side events and only ever change through the
//! read flag or deletion. `is_read` starts false and is never set back.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{AdminNotification, NotificationDraft, NotificationType};
use crate::validation::validate_notification;

const NOTIFICATION_COLUMNS: &str = "id, notification_type, title, message, user_id, user_name, \
                                    user_email, priority, is_read, data, created_at";

/// Record a new notification. Always unread.
pub async fn create_notification(
    pool: &SqlitePool,
    draft: &NotificationDraft,
    now: DateTime<Utc>,
) -> Result<AdminNotification> {
    validate_notification(draft)?;

    let query = format!(
        r#"
        INSERT INTO admin_notifications (
            notification_type, title, message, user_id, user_name, user_email,
            priority, is_read, data, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
        RETURNING {NOTIFICATION_COLUMNS}
        "#
    );

    let notification = sqlx::query_as::<_, AdminNotification>(&query)
        .bind(draft.notification_type)
        .bind(draft.title.trim())
        .bind(draft.message.trim())
        .bind(draft.user_id)
        .bind(&draft.user_name)
        .bind(&draft.user_email)
        .bind(draft.priority)
        .bind(draft.data.as_ref().map(Json))
        .bind(now)
        .fetch_one(pool)
        .await?;

    tracing::info!(
        id = notification.id,
        kind = ?notification.notification_type,
        "Recorded admin notification"
    );
    Ok(notification)
}

/// List notifications newest first.
pub async fn list_notifications(
    pool: &SqlitePool,
    unread_only: bool,
    limit: i64,
) -> Result<Vec<AdminNotification>> {
    let query = format!(
        r#"
        SELECT {NOTIFICATION_COLUMNS}
        FROM admin_notifications
        WHERE (? = 0 OR is_read = 0)
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#
    );
    let rows = sqlx::query_as::<_, AdminNotification>(&query)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Get one notification.
pub async fn get_notification(pool: &SqlitePool, id: i64) -> Result<AdminNotification> {
    let query = format!("SELECT {NOTIFICATION_COLUMNS} FROM admin_notifications WHERE id = ?");
    sqlx::query_as::<_, AdminNotification>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("AdminNotification", id))
}

/// Mark one notification read. Marking an already-read row is a no-op.
pub async fn mark_read(pool: &SqlitePool, id: i64) -> Result<()> {
    // SQLite counts matched rows, so an already-read row still reports 1.
    let result = sqlx::query("UPDATE admin_notifications SET is_read = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("AdminNotification", id));
    }

    Ok(())
}

/// Mark every unread notification read in one statement.
///
/// Returns how many rows changed. Rows inserted concurrently may or may not
/// be included.
pub async fn mark_all_read(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("UPDATE admin_notifications SET is_read = 1 WHERE is_read = 0")
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Permanently delete a notification.
pub async fn delete_notification(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM admin_notifications WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("AdminNotification", id));
    }

    Ok(())
}

/// Live count of unread notifications.
pub async fn unread_count(pool: &SqlitePool) -> Result<i64> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_notifications WHERE is_read = 0")
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// Whether a notification of `kind` was ever recorded for `user_id`.
pub async fn exists_for_user(
    pool: &SqlitePool,
    user_id: i64,
    kind: NotificationType,
) -> Result<bool> {
    let found = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1
        FROM admin_notifications
        WHERE user_id = ? AND notification_type = ?
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(kind)
    .fetch_optional(pool)
    .await?;

    Ok(found.is_some())
}
