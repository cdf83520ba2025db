//! Follow-up reminders, recomputed on every request.

use axum::extract::State;
use axum::Json;
use database::{client, follow_up};
use reminders::{derive_reminders, Reminder, ReminderSummary};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

#[derive(Serialize)]
pub struct RemindersResponse {
    pub notifications: Vec<Reminder>,
    pub summary: ReminderSummary,
}

/// Derived reminder list for the caller.
pub async fn reminders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<RemindersResponse>> {
    let notifications = load_reminders(&state, user.id).await?;
    let summary = ReminderSummary::from_reminders(&notifications);
    Ok(Json(RemindersResponse {
        notifications,
        summary,
    }))
}

/// Build the sorted reminder list for `user_id` from fresh data.
pub(crate) async fn load_reminders(state: &AppState, user_id: i64) -> Result<Vec<Reminder>> {
    let pool = state.db.pool();
    let open = follow_up::list_open_follow_ups(pool, user_id).await?;
    let names = client::client_names(pool, user_id).await?;

    Ok(derive_reminders(&open, &names, &state.settings.local_now()))
}
