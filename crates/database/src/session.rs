//! Login session storage.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::Session;

/// Store a session for `user_id` that expires after `ttl`.
pub async fn create_session(
    pool: &SqlitePool,
    token: &str,
    user_id: i64,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<Session> {
    let session = sqlx::query_as::<_, Session>(
        r#"
        INSERT INTO sessions (token, user_id, created_at, expires_at)
        VALUES (?, ?, ?, ?)
        RETURNING token, user_id, created_at, expires_at
        "#,
    )
    .bind(token)
    .bind(user_id)
    .bind(now)
    .bind(now + ttl)
    .fetch_one(pool)
    .await?;

    Ok(session)
}

/// Look up a session that has not yet expired.
pub async fn get_active_session(
    pool: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(
        r#"
        SELECT token, user_id, created_at, expires_at
        FROM sessions
        WHERE token = ? AND expires_at > ?
        "#,
    )
    .bind(token)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// Delete a session. Unknown tokens are ignored.
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

/// Remove expired sessions.
pub async fn prune_expired(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
