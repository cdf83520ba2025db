//! Journey progress routes.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use database::{journey, JourneyMilestone, JourneyProgress, MilestoneAward, MilestoneKind};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyResponse {
    pub progress: JourneyProgress,
    pub milestones: Vec<JourneyMilestone>,
    /// Points still needed to reach the next level.
    pub points_to_next_level: i64,
}

/// Progress and milestones for the caller.
pub async fn journey(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<JourneyResponse>> {
    let pool = state.db.pool();
    journey::ensure_journey(pool, user.id, Utc::now()).await?;

    let progress = journey::get_progress(pool, user.id).await?;
    let milestones = journey::list_milestones(pool, user.id).await?;
    let points_to_next_level =
        progress.current_level * journey::POINTS_PER_LEVEL - progress.total_points;

    Ok(Json(JourneyResponse {
        progress,
        milestones,
        points_to_next_level,
    }))
}

/// Complete a milestone by name. Completing it again awards nothing.
pub async fn complete_milestone(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(kind): Path<String>,
) -> Result<Json<MilestoneAward>> {
    let kind: MilestoneKind = kind.parse()?;
    let award = journey::complete_milestone(
        state.db.pool(),
        user.id,
        kind,
        &state.settings.stage_thresholds,
        Utc::now(),
    )
    .await?;
    Ok(Json(award))
}
