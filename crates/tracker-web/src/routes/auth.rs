//! Registration, login and session routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use database::{user, DatabaseError, NewUser, User, UserRole};
use serde::Deserialize;
use tower_cookies::Cookies;
use tracing::info;

use crate::auth::{self, CurrentUser};
use crate::error::{ApiError, Result};
use crate::events;
use crate::state::AppState;

/// Registration request.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login request.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Create an account and sign it in.
///
/// The first account becomes `master_admin`. Everyone else starts as a
/// `user` on a trial.
pub async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    auth::validate_password(&req.password)?;

    let pool = state.db.pool();
    let now = Utc::now();

    let first = user::count_users(pool).await? == 0;
    let (role, trial_ends_at) = if first {
        (UserRole::MasterAdmin, None)
    } else {
        (
            UserRole::User,
            Some(now + Duration::days(state.settings.trial_days)),
        )
    };

    let password_hash = auth::hash_password(state.settings.password_hashing, req.password).await?;

    let new_user = NewUser {
        name: req.name,
        email: req.email,
        password_hash,
        role,
        trial_ends_at,
    };
    let user = user::create_user(pool, &new_user, now).await?;

    auth::start_session(&state, &cookies, &user).await?;
    info!(user_id = user.id, role = user.role.as_str(), "User registered");

    events::user_registered(&state, &user).await;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Verify credentials and start a session.
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(req): Json<LoginRequest>,
) -> Result<Json<User>> {
    let pool = state.db.pool();

    let mut user = match user::get_user_by_email(pool, &req.email).await {
        Ok(user) => user,
        Err(DatabaseError::NotFound { .. }) => return Err(ApiError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };

    if !auth::verify_password(req.password, user.password_hash.clone()).await? {
        info!(user_id = user.id, "Login rejected");
        return Err(ApiError::InvalidCredentials);
    }

    let now = Utc::now();
    user::record_login(pool, user.id, now).await?;
    user.last_login_at = Some(now);

    auth::start_session(&state, &cookies, &user).await?;
    info!(user_id = user.id, "User logged in");

    events::user_logged_in(&state, &user).await;

    Ok(Json(user))
}

/// End the current session.
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Result<StatusCode> {
    auth::end_session(&state, &cookies).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in account.
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
