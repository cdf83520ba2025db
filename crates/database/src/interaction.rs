//! Interaction log. Entries are append-only; there is no update path.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::client::get_client;
use crate::error::Result;
use crate::models::{Interaction, InteractionDraft, InteractionType};
use crate::validation::{validate_optional, MAX_NOTES_LENGTH};

/// Log an interaction against a client owned by `user_id`.
pub async fn create_interaction(
    pool: &SqlitePool,
    user_id: i64,
    draft: &InteractionDraft,
    now: DateTime<Utc>,
) -> Result<Interaction> {
    validate_optional("notes", Some(&draft.notes), MAX_NOTES_LENGTH)?;
    get_client(pool, user_id, draft.client_id).await?;

    let interaction = sqlx::query_as::<_, Interaction>(
        r#"
        INSERT INTO interactions (client_id, interaction_type, notes, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, client_id, interaction_type, notes, created_at
        "#,
    )
    .bind(draft.client_id)
    .bind(draft.interaction_type)
    .bind(draft.notes.trim())
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(interaction)
}

/// List interactions newest first, optionally for a single client.
pub async fn list_interactions(
    pool: &SqlitePool,
    user_id: i64,
    client_id: Option<i64>,
) -> Result<Vec<Interaction>> {
    let rows = sqlx::query_as::<_, Interaction>(
        r#"
        SELECT i.id, i.client_id, i.interaction_type, i.notes, i.created_at
        FROM interactions i
        INNER JOIN clients c ON c.id = i.client_id
        WHERE c.user_id = ? AND (? IS NULL OR i.client_id = ?)
        ORDER BY i.created_at DESC, i.id DESC
        "#,
    )
    .bind(user_id)
    .bind(client_id)
    .bind(client_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Count a user's interactions grouped by type.
pub async fn count_by_type(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<(InteractionType, i64)>> {
    let rows = sqlx::query_as::<_, (InteractionType, i64)>(
        r#"
        SELECT i.interaction_type, COUNT(*) as count
        FROM interactions i
        INNER JOIN clients c ON c.id = i.client_id
        WHERE c.user_id = ?
        GROUP BY i.interaction_type
        ORDER BY count DESC, i.interaction_type
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
