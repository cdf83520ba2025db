//! Follow-up routes.
//!
//! The overdue and upcoming views bucket open follow-ups by due date in the
//! configured reminder offset. Stored status is not consulted.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use database::follow_up::{self, FollowUpFilter};
use database::{FollowUp, FollowUpDraft, FollowUpStatus, MilestoneKind};
use reminders::{classify, ReminderKind};
use serde::Deserialize;
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::events;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub status: Option<FollowUpStatus>,
    pub client_id: Option<i64>,
}

pub async fn list_follow_ups(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<FollowUp>>> {
    let filter = FollowUpFilter {
        status: query.status,
        client_id: query.client_id,
    };
    let follow_ups = follow_up::list_follow_ups(state.db.pool(), user.id, filter).await?;
    Ok(Json(follow_ups))
}

pub async fn create_follow_up(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(draft): Json<FollowUpDraft>,
) -> Result<(StatusCode, Json<FollowUp>)> {
    let follow_up =
        follow_up::create_follow_up(state.db.pool(), user.id, &draft, Utc::now()).await?;
    info!(user_id = user.id, follow_up_id = follow_up.id, "Follow-up scheduled");

    events::award(&state, user.id, MilestoneKind::FirstFollowUp).await;

    Ok((StatusCode::CREATED, Json(follow_up)))
}

pub async fn get_follow_up(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<FollowUp>> {
    let follow_up = follow_up::get_follow_up(state.db.pool(), user.id, id).await?;
    Ok(Json(follow_up))
}

/// Replace a follow-up's writable fields.
///
/// Moving a follow-up into `completed` completes the matching milestone.
pub async fn update_follow_up(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(draft): Json<FollowUpDraft>,
) -> Result<Json<FollowUp>> {
    let pool = state.db.pool();
    let previous = follow_up::get_follow_up(pool, user.id, id).await?;
    let updated = follow_up::update_follow_up(pool, user.id, id, &draft, Utc::now()).await?;

    if previous.status != FollowUpStatus::Completed && updated.status == FollowUpStatus::Completed
    {
        info!(user_id = user.id, follow_up_id = id, "Follow-up completed");
        events::award(&state, user.id, MilestoneKind::FollowUpCompleted).await;
    }

    Ok(Json(updated))
}

pub async fn delete_follow_up(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    follow_up::delete_follow_up(state.db.pool(), user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Open follow-ups whose due day has passed.
pub async fn overdue(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<FollowUp>>> {
    let follow_ups = open_where(&state, user.id, |kind| kind == ReminderKind::Overdue).await?;
    Ok(Json(follow_ups))
}

/// Open follow-ups due from today through the next seven days.
pub async fn upcoming(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<FollowUp>>> {
    let follow_ups = open_where(&state, user.id, |kind| kind != ReminderKind::Overdue).await?;
    Ok(Json(follow_ups))
}

async fn open_where(
    state: &AppState,
    user_id: i64,
    keep: impl Fn(ReminderKind) -> bool,
) -> Result<Vec<FollowUp>> {
    let now = state.settings.local_now();
    let open = follow_up::list_open_follow_ups(state.db.pool(), user_id).await?;

    Ok(open
        .into_iter()
        .filter(|f| classify(f.due_date, &now).is_some_and(&keep))
        .collect())
}
