//! User account operations.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{NewUser, User, UserRole};
use crate::validation::{validate_email, validate_required, MAX_NAME_LENGTH};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, trial_ends_at, created_at, last_login_at";

/// Create a new user and return the stored row.
pub async fn create_user(pool: &SqlitePool, user: &NewUser, now: DateTime<Utc>) -> Result<User> {
    validate_required("name", &user.name, MAX_NAME_LENGTH)?;
    validate_email(&user.email)?;

    let email = user.email.trim();
    let query = format!(
        r#"
        INSERT INTO users (name, email, password_hash, role, trial_ends_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    );

    sqlx::query_as::<_, User>(&query)
        .bind(user.name.trim())
        .bind(email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.trial_ends_at)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return DatabaseError::AlreadyExists {
                        entity: "User",
                        id: email.to_string(),
                    };
                }
            }
            DatabaseError::Sqlx(e)
        })
}

/// Get a user by ID.
pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<User> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("User", id))
}

/// Get a user by email (case-insensitive).
pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<User> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
    sqlx::query_as::<_, User>(&query)
        .bind(email.trim())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("User", email.trim()))
}

/// List all users, newest first.
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
    let users = sqlx::query_as::<_, User>(&query).fetch_all(pool).await?;
    Ok(users)
}

/// Users with a trial ending before `cutoff`, soonest first.
pub async fn list_trials_ending_before(
    pool: &SqlitePool,
    cutoff: DateTime<Utc>,
) -> Result<Vec<User>> {
    let query = format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE trial_ends_at IS NOT NULL AND trial_ends_at < ?
        ORDER BY trial_ends_at
        "#
    );
    let users = sqlx::query_as::<_, User>(&query)
        .bind(cutoff)
        .fetch_all(pool)
        .await?;
    Ok(users)
}

/// Change a user's role and return the updated row.
pub async fn update_role(pool: &SqlitePool, id: i64, role: UserRole) -> Result<User> {
    let query = format!("UPDATE users SET role = ? WHERE id = ? RETURNING {USER_COLUMNS}");
    sqlx::query_as::<_, User>(&query)
        .bind(role)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("User", id))
}

/// Stamp the last successful login.
pub async fn record_login(pool: &SqlitePool, id: i64, now: DateTime<Utc>) -> Result<()> {
    let result = sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("User", id));
    }

    Ok(())
}

/// Delete a user by ID. Owned rows cascade.
pub async fn delete_user(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("User", id));
    }

    Ok(())
}

/// Count total users.
pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
