//! Session authentication.
//!
//! A session is an opaque random token stored in the `sessions` table and
//! carried in an HttpOnly cookie. Handlers receive the authenticated account
//! through the [`CurrentUser`] and [`AdminUser`] extractors, built fresh for
//! every request.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use database::{session, user, DatabaseError, User};
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use crate::error::{ApiError, Result};
use crate::state::{AppState, PasswordHashing, Settings};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "tracker_session";

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

fn hasher(config: PasswordHashing) -> Result<Argon2<'static>> {
    let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
        .map_err(|e| ApiError::Internal(format!("Invalid Argon2 parameters: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Reject passwords outside the accepted length range.
pub fn validate_password(password: &str) -> Result<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password into a PHC string. Runs on the blocking pool.
pub async fn hash_password(config: PasswordHashing, password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        let hash = hasher(config)?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))?;
        Ok(hash.to_string())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Hashing task failed: {e}")))?
}

/// Check a password against a stored PHC string.
///
/// The cost parameters are read from the hash itself, so hashes made with
/// older settings still verify.
pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash)
            .map_err(|e| ApiError::Internal(format!("Invalid password hash format: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(ApiError::Internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Verification task failed: {e}")))?
}

/// Create a session for `user` and set the cookie.
pub async fn start_session(state: &AppState, cookies: &Cookies, user: &User) -> Result<()> {
    let token = uuid::Uuid::new_v4().to_string();
    session::create_session(
        state.db.pool(),
        &token,
        user.id,
        state.settings.session_ttl,
        Utc::now(),
    )
    .await?;

    cookies.add(session_cookie(&state.settings, token));
    Ok(())
}

fn session_cookie(settings: &Settings, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(settings.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(settings.session_ttl.num_seconds()))
        .build()
}

/// Delete the current session, if any, and expire the cookie.
pub async fn end_session(state: &AppState, cookies: &Cookies) -> Result<()> {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        session::delete_session(state.db.pool(), cookie.value()).await?;
    }

    cookies.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    Ok(())
}

/// The account behind the request's session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| ApiError::Internal(msg.to_string()))?;

        let token = cookies
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(ApiError::Unauthorized)?;

        let pool = state.db.pool();
        let session = session::get_active_session(pool, &token, Utc::now())
            .await?
            .ok_or(ApiError::Unauthorized)?;

        match user::get_user(pool, session.user_id).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(DatabaseError::NotFound { .. }) => Err(ApiError::Unauthorized),
            Err(e) => Err(e.into()),
        }
    }
}

/// A [`CurrentUser`] whose role grants admin access.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            tracing::warn!(user_id = user.id, "Admin route denied");
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> PasswordHashing {
        PasswordHashing {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password(fast(), "correct horse".to_string())
            .await
            .unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(verify_password("correct horse".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password("wrong horse".to_string(), hash)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_verify_rejects_garbage_hash() {
        let result = verify_password("whatever".to_string(), "not-a-hash".to_string()).await;
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_session_cookie_flags() {
        let settings = Settings::default();
        let cookie = session_cookie(&settings, "abc".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::hours(168))
        );
    }
}
