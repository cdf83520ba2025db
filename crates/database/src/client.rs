//! Client record CRUD operations.
//!
//! Every query is scoped to the owning user; a client owned by someone else
//! is reported as not found.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Client, ClientDraft, ClientStatus, Priority};
use crate::validation::{normalize_optional, normalize_tags, validate_client};

const CLIENT_COLUMNS: &str = "id, user_id, name, email, phone, company, status, priority, \
                              category, source, tags, notes, created_at, updated_at";

/// Create a client owned by `user_id`.
pub async fn create_client(
    pool: &SqlitePool,
    user_id: i64,
    draft: &ClientDraft,
    now: DateTime<Utc>,
) -> Result<Client> {
    validate_client(draft)?;

    let query = format!(
        r#"
        INSERT INTO clients (
            user_id, name, email, phone, company, status, priority,
            category, source, tags, notes, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {CLIENT_COLUMNS}
        "#
    );

    let client = sqlx::query_as::<_, Client>(&query)
        .bind(user_id)
        .bind(draft.name.trim())
        .bind(draft.email.trim())
        .bind(normalize_optional(draft.phone.as_deref()))
        .bind(normalize_optional(draft.company.as_deref()))
        .bind(draft.status)
        .bind(draft.priority)
        .bind(normalize_optional(draft.category.as_deref()))
        .bind(normalize_optional(draft.source.as_deref()))
        .bind(Json(normalize_tags(&draft.tags)))
        .bind(normalize_optional(draft.notes.as_deref()))
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

    tracing::debug!(client_id = client.id, user_id, "Created client");
    Ok(client)
}

/// Get one client.
pub async fn get_client(pool: &SqlitePool, user_id: i64, id: i64) -> Result<Client> {
    let query = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ? AND user_id = ?");
    sqlx::query_as::<_, Client>(&query)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Client", id))
}

/// List clients, optionally filtered by status, most recently updated first.
pub async fn list_clients(
    pool: &SqlitePool,
    user_id: i64,
    status: Option<ClientStatus>,
) -> Result<Vec<Client>> {
    let query = format!(
        r#"
        SELECT {CLIENT_COLUMNS}
        FROM clients
        WHERE user_id = ? AND (? IS NULL OR status = ?)
        ORDER BY updated_at DESC, id DESC
        "#
    );
    let clients = sqlx::query_as::<_, Client>(&query)
        .bind(user_id)
        .bind(status)
        .bind(status)
        .fetch_all(pool)
        .await?;

    Ok(clients)
}

/// Case-insensitive substring search over name, email, company and tags.
///
/// Matching happens in Rust with Unicode case folding. SQLite's `LOWER` and
/// `LIKE` only fold ASCII, so names such as "Émile" would never match there.
pub async fn search_clients(pool: &SqlitePool, user_id: i64, term: &str) -> Result<Vec<Client>> {
    let needle = term.trim().to_lowercase();
    let mut clients = list_clients(pool, user_id, None).await?;
    if needle.is_empty() {
        return Ok(clients);
    }

    clients.retain(|client| matches_term(client, &needle));
    clients.sort_by_cached_key(|client| (client.name.to_lowercase(), client.id));

    Ok(clients)
}

/// Whether any searchable field contains `needle`, which must already be
/// lowercased.
fn matches_term(client: &Client, needle: &str) -> bool {
    let contains = |value: &str| value.to_lowercase().contains(needle);

    contains(&client.name)
        || contains(&client.email)
        || client.company.as_deref().is_some_and(contains)
        || client.tags.iter().any(|tag| contains(tag))
}

/// Replace all writable fields of a client.
pub async fn update_client(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    draft: &ClientDraft,
    now: DateTime<Utc>,
) -> Result<Client> {
    validate_client(draft)?;

    let query = format!(
        r#"
        UPDATE clients
        SET name = ?, email = ?, phone = ?, company = ?, status = ?, priority = ?,
            category = ?, source = ?, tags = ?, notes = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        RETURNING {CLIENT_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Client>(&query)
        .bind(draft.name.trim())
        .bind(draft.email.trim())
        .bind(normalize_optional(draft.phone.as_deref()))
        .bind(normalize_optional(draft.company.as_deref()))
        .bind(draft.status)
        .bind(draft.priority)
        .bind(normalize_optional(draft.category.as_deref()))
        .bind(normalize_optional(draft.source.as_deref()))
        .bind(Json(normalize_tags(&draft.tags)))
        .bind(normalize_optional(draft.notes.as_deref()))
        .bind(now)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Client", id))
}

/// Delete a client together with its interactions and follow-ups.
pub async fn delete_client(pool: &SqlitePool, user_id: i64, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM clients WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Client", id));
    }

    Ok(())
}

/// Map of client id to display name for one user.
pub async fn client_names(pool: &SqlitePool, user_id: i64) -> Result<HashMap<i64, String>> {
    let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM clients WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().collect())
}

/// Count a user's clients.
pub async fn count_clients(pool: &SqlitePool, user_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clients WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Count a user's clients grouped by status.
pub async fn count_by_status(pool: &SqlitePool, user_id: i64) -> Result<Vec<(ClientStatus, i64)>> {
    let rows = sqlx::query_as::<_, (ClientStatus, i64)>(
        r#"
        SELECT status, COUNT(*) as count
        FROM clients
        WHERE user_id = ?
        GROUP BY status
        ORDER BY count DESC, status
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Count a user's clients grouped by priority.
pub async fn count_by_priority(pool: &SqlitePool, user_id: i64) -> Result<Vec<(Priority, i64)>> {
    let rows = sqlx::query_as::<_, (Priority, i64)>(
        r#"
        SELECT priority, COUNT(*) as count
        FROM clients
        WHERE user_id = ?
        GROUP BY priority
        ORDER BY count DESC, priority
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(name: &str, company: Option<&str>, tags: &[&str]) -> Client {
        let now = chrono::Utc::now();
        Client {
            id: 1,
            user_id: 1,
            name: name.to_string(),
            email: "contact@example.test".to_string(),
            phone: None,
            company: company.map(str::to_string),
            status: ClientStatus::default(),
            priority: Priority::default(),
            category: None,
            source: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_matches_term_folds_unicode_case() {
        let emile = client("Émile Zola", None, &[]);
        assert!(matches_term(&emile, "émile"));
        assert!(matches_term(&emile, &"ÉMILE".to_lowercase()));
        assert!(!matches_term(&emile, "emile"));
    }

    #[test]
    fn test_matches_term_is_literal() {
        let acme = client("Acme", Some("Acme Holdings"), &["50%_off"]);
        assert!(matches_term(&acme, "holdings"));
        assert!(matches_term(&acme, "50%_off"));
        assert!(!matches_term(&acme, "50_%"));
        assert!(!matches_term(&acme, "%"));
    }
}
