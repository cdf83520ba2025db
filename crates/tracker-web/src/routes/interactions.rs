//! Interaction log routes.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use database::{interaction, Interaction, InteractionDraft, MilestoneKind};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::events;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub client_id: Option<i64>,
}

pub async fn list_interactions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Interaction>>> {
    let interactions =
        interaction::list_interactions(state.db.pool(), user.id, query.client_id).await?;
    Ok(Json(interactions))
}

pub async fn create_interaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(draft): Json<InteractionDraft>,
) -> Result<(StatusCode, Json<Interaction>)> {
    let interaction =
        interaction::create_interaction(state.db.pool(), user.id, &draft, Utc::now()).await?;

    events::award(&state, user.id, MilestoneKind::FirstInteraction).await;

    Ok((StatusCode::CREATED, Json(interaction)))
}
