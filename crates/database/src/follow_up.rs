//! Follow-up scheduling.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::client::get_client;
use crate::error::{DatabaseError, Result};
use crate::models::{FollowUp, FollowUpDraft, FollowUpStatus};
use crate::validation::{normalize_optional, validate_follow_up};

const FOLLOW_UP_COLUMNS: &str = "f.id, f.client_id, f.title, f.description, f.due_date, \
                                 f.status, f.priority, f.created_at, f.completed_at";

/// Optional filters for [`list_follow_ups`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowUpFilter {
    pub status: Option<FollowUpStatus>,
    pub client_id: Option<i64>,
}

/// Schedule a follow-up for a client owned by `user_id`.
pub async fn create_follow_up(
    pool: &SqlitePool,
    user_id: i64,
    draft: &FollowUpDraft,
    now: DateTime<Utc>,
) -> Result<FollowUp> {
    validate_follow_up(draft)?;
    get_client(pool, user_id, draft.client_id).await?;

    let completed_at = (draft.status == FollowUpStatus::Completed).then_some(now);

    let follow_up = sqlx::query_as::<_, FollowUp>(
        r#"
        INSERT INTO follow_ups (
            client_id, title, description, due_date, status, priority, created_at, completed_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, client_id, title, description, due_date, status, priority,
                  created_at, completed_at
        "#,
    )
    .bind(draft.client_id)
    .bind(draft.title.trim())
    .bind(normalize_optional(draft.description.as_deref()))
    .bind(draft.due_date)
    .bind(draft.status)
    .bind(draft.priority)
    .bind(now)
    .bind(completed_at)
    .fetch_one(pool)
    .await?;

    Ok(follow_up)
}

/// Get one follow-up.
pub async fn get_follow_up(pool: &SqlitePool, user_id: i64, id: i64) -> Result<FollowUp> {
    let query = format!(
        r#"
        SELECT {FOLLOW_UP_COLUMNS}
        FROM follow_ups f
        INNER JOIN clients c ON c.id = f.client_id
        WHERE f.id = ? AND c.user_id = ?
        "#
    );
    sqlx::query_as::<_, FollowUp>(&query)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("FollowUp", id))
}

/// List follow-ups by ascending due date.
pub async fn list_follow_ups(
    pool: &SqlitePool,
    user_id: i64,
    filter: FollowUpFilter,
) -> Result<Vec<FollowUp>> {
    let query = format!(
        r#"
        SELECT {FOLLOW_UP_COLUMNS}
        FROM follow_ups f
        INNER JOIN clients c ON c.id = f.client_id
        WHERE c.user_id = ?
          AND (? IS NULL OR f.status = ?)
          AND (? IS NULL OR f.client_id = ?)
        ORDER BY f.due_date, f.id
        "#
    );
    let rows = sqlx::query_as::<_, FollowUp>(&query)
        .bind(user_id)
        .bind(filter.status)
        .bind(filter.status)
        .bind(filter.client_id)
        .bind(filter.client_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Every follow-up that is not completed, regardless of stored status.
pub async fn list_open_follow_ups(pool: &SqlitePool, user_id: i64) -> Result<Vec<FollowUp>> {
    let query = format!(
        r#"
        SELECT {FOLLOW_UP_COLUMNS}
        FROM follow_ups f
        INNER JOIN clients c ON c.id = f.client_id
        WHERE c.user_id = ? AND f.status != 'completed'
        ORDER BY f.due_date, f.id
        "#
    );
    let rows = sqlx::query_as::<_, FollowUp>(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Replace all writable fields of a follow-up.
///
/// `completed_at` is stamped the first time the status becomes `completed`
/// and cleared if it moves away from `completed`.
pub async fn update_follow_up(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    draft: &FollowUpDraft,
    now: DateTime<Utc>,
) -> Result<FollowUp> {
    validate_follow_up(draft)?;
    // The target client must belong to the same user as well.
    get_client(pool, user_id, draft.client_id).await?;

    sqlx::query_as::<_, FollowUp>(
        r#"
        UPDATE follow_ups
        SET client_id = ?1,
            title = ?2,
            description = ?3,
            due_date = ?4,
            status = ?5,
            priority = ?6,
            completed_at = CASE
                WHEN ?5 = 'completed' THEN COALESCE(completed_at, ?7)
                ELSE NULL
            END
        WHERE id = ?8
          AND client_id IN (SELECT id FROM clients WHERE user_id = ?9)
        RETURNING id, client_id, title, description, due_date, status, priority,
                  created_at, completed_at
        "#,
    )
    .bind(draft.client_id)
    .bind(draft.title.trim())
    .bind(normalize_optional(draft.description.as_deref()))
    .bind(draft.due_date)
    .bind(draft.status)
    .bind(draft.priority)
    .bind(now)
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("FollowUp", id))
}

/// Delete a follow-up.
pub async fn delete_follow_up(pool: &SqlitePool, user_id: i64, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM follow_ups
        WHERE id = ?
          AND client_id IN (SELECT id FROM clients WHERE user_id = ?)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("FollowUp", id));
    }

    Ok(())
}

/// Count a user's follow-ups grouped by stored status.
pub async fn count_by_status(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<(FollowUpStatus, i64)>> {
    let rows = sqlx::query_as::<_, (FollowUpStatus, i64)>(
        r#"
        SELECT f.status, COUNT(*) as count
        FROM follow_ups f
        INNER JOIN clients c ON c.id = f.client_id
        WHERE c.user_id = ?
        GROUP BY f.status
        ORDER BY count DESC, f.status
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
