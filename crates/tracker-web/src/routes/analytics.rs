//! Per-user analytics.

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;
use database::{
    client, follow_up, interaction, ClientStatus, FollowUpStatus, InteractionType, Priority,
};
use reminders::ReminderSummary;
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::routes::notifications::load_reminders;
use crate::state::AppState;

/// Analytics summary.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_clients: i64,
    pub total_follow_ups: i64,
    pub total_interactions: i64,
    pub clients_by_status: HashMap<ClientStatus, i64>,
    pub clients_by_priority: HashMap<Priority, i64>,
    /// Stored follow-up status counts.
    pub follow_ups_by_status: HashMap<FollowUpStatus, i64>,
    /// Open follow-ups bucketed by due date.
    pub reminders: ReminderSummary,
    pub interactions_by_type: HashMap<InteractionType, i64>,
}

/// Get analytics for the caller.
pub async fn analytics(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Analytics>> {
    let pool = state.db.pool();

    let total_clients = client::count_clients(pool, user.id).await?;
    let clients_by_status: HashMap<_, _> =
        client::count_by_status(pool, user.id).await?.into_iter().collect();
    let clients_by_priority: HashMap<_, _> =
        client::count_by_priority(pool, user.id).await?.into_iter().collect();
    let follow_ups_by_status: HashMap<_, _> =
        follow_up::count_by_status(pool, user.id).await?.into_iter().collect();
    let interactions_by_type: HashMap<_, _> =
        interaction::count_by_type(pool, user.id).await?.into_iter().collect();

    let reminders = ReminderSummary::from_reminders(&load_reminders(&state, user.id).await?);

    Ok(Json(Analytics {
        total_clients,
        total_follow_ups: follow_ups_by_status.values().sum(),
        total_interactions: interactions_by_type.values().sum(),
        clients_by_status,
        clients_by_priority,
        follow_ups_by_status,
        reminders,
        interactions_by_type,
    }))
}
