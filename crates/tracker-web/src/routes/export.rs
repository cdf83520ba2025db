//! Export routes.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use database::{client, follow_up, FollowUp, MilestoneKind};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::events;
use crate::export::{self, ExportFormat, CLIENT_FIELDS, FOLLOW_UP_FIELDS};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
    pub fields: Option<String>,
}

/// A follow-up with its client's name, for export.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FollowUpRow {
    #[serde(flatten)]
    follow_up: FollowUp,
    client_name: String,
}

pub async fn export_clients(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ExportQuery>,
) -> Result<Response> {
    let fields = export::select_fields(query.fields.as_deref(), CLIENT_FIELDS)?;
    let clients = client::list_clients(state.db.pool(), user.id, None).await?;

    let rows = export::project(&clients, &fields)?;
    let body = export::render(query.format, &rows, &fields)?;
    info!(user_id = user.id, rows = rows.len(), "Exported clients");

    events::award(&state, user.id, MilestoneKind::FirstExport).await;
    Ok(attachment(&state, "clients", query.format, body))
}

pub async fn export_follow_ups(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ExportQuery>,
) -> Result<Response> {
    let fields = export::select_fields(query.fields.as_deref(), FOLLOW_UP_FIELDS)?;
    let pool = state.db.pool();
    let names = client::client_names(pool, user.id).await?;
    let follow_ups = follow_up::list_follow_ups(pool, user.id, Default::default()).await?;

    let records: Vec<FollowUpRow> = follow_ups
        .into_iter()
        .map(|f| FollowUpRow {
            client_name: names.get(&f.client_id).cloned().unwrap_or_default(),
            follow_up: f,
        })
        .collect();

    let rows = export::project(&records, &fields)?;
    let body = export::render(query.format, &rows, &fields)?;
    info!(user_id = user.id, rows = rows.len(), "Exported follow-ups");

    events::award(&state, user.id, MilestoneKind::FirstExport).await;
    Ok(attachment(&state, "follow-ups", query.format, body))
}

fn attachment(state: &AppState, kind: &str, format: ExportFormat, body: Vec<u8>) -> Response {
    let name = export::filename(kind, state.settings.local_now().date_naive(), format);
    (
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", name),
            ),
        ],
        body,
    )
        .into_response()
}
