//! Client record routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use database::{
    client, interaction, Client, ClientDraft, ClientStatus, Interaction, InteractionDraft,
    InteractionType, MilestoneKind,
};
use mailer::{Email, EmailSender};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::CurrentUser;
use crate::error::{ApiError, Result};
use crate::events;
use crate::state::AppState;

/// Creating this many clients completes the `ten_clients` milestone.
const TEN_CLIENTS: i64 = 10;

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<ClientStatus>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Request to email a client.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub html_body: Option<String>,
}

/// Result of a sent email.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    pub sent: bool,
    /// Absent when the email went out but could not be logged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction: Option<Interaction>,
}

/// List the caller's clients, optionally by status.
pub async fn list_clients(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Client>>> {
    let clients = client::list_clients(state.db.pool(), user.id, query.status).await?;
    Ok(Json(clients))
}

/// Substring search over name, email, company and tags. A blank query lists
/// everything.
pub async fn search_clients(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Client>>> {
    let clients = client::search_clients(state.db.pool(), user.id, &query.q).await?;
    Ok(Json(clients))
}

pub async fn create_client(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(draft): Json<ClientDraft>,
) -> Result<(StatusCode, Json<Client>)> {
    let pool = state.db.pool();
    let client = client::create_client(pool, user.id, &draft, Utc::now()).await?;
    info!(user_id = user.id, client_id = client.id, "Client created");

    events::award(&state, user.id, MilestoneKind::FirstClient).await;
    match client::count_clients(pool, user.id).await {
        Ok(count) if count >= TEN_CLIENTS => {
            events::award(&state, user.id, MilestoneKind::TenClients).await
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(user_id = user.id, error = %e, "Failed to count clients"),
    }

    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn get_client(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Client>> {
    let client = client::get_client(state.db.pool(), user.id, id).await?;
    Ok(Json(client))
}

/// Replace a client's writable fields.
pub async fn update_client(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(draft): Json<ClientDraft>,
) -> Result<Json<Client>> {
    let client = client::update_client(state.db.pool(), user.id, id, &draft, Utc::now()).await?;
    Ok(Json(client))
}

/// Delete a client with its interactions and follow-ups.
pub async fn delete_client(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    client::delete_client(state.db.pool(), user.id, id).await?;
    info!(user_id = user.id, client_id = id, "Client deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Interaction history for one client, newest first.
pub async fn client_interactions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Interaction>>> {
    let pool = state.db.pool();
    client::get_client(pool, user.id, id).await?;
    let interactions = interaction::list_interactions(pool, user.id, Some(id)).await?;
    Ok(Json(interactions))
}

/// Email a client and log the send as an `email` interaction.
pub async fn send_email(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<SendEmailRequest>,
) -> Result<Json<SendEmailResponse>> {
    let mailer = state.mailer.clone().ok_or(ApiError::EmailDisabled)?;

    if req.subject.trim().is_empty() {
        return Err(ApiError::BadRequest("Subject is required".to_string()));
    }
    if req.body.trim().is_empty() {
        return Err(ApiError::BadRequest("Body is required".to_string()));
    }

    let pool = state.db.pool();
    let client = client::get_client(pool, user.id, id).await?;

    let mut email = Email::new(&client.email, req.subject.trim(), req.body);
    email.reply_to(&user.email);
    for cc in req.cc {
        email.add_cc(cc);
    }
    if let Some(html) = req.html_body {
        email.with_html(html);
    }

    mailer.send(&email).await?;
    info!(user_id = user.id, client_id = client.id, "Email sent to client");

    let draft = InteractionDraft {
        client_id: client.id,
        interaction_type: InteractionType::Email,
        notes: format!("Email sent: {}", email.subject),
    };
    // The email is already out; an unrecorded interaction is not an error.
    let result = interaction::create_interaction(pool, user.id, &draft, Utc::now()).await;
    let interaction = match result {
        Ok(interaction) => Some(interaction),
        Err(e) => {
            warn!(
                user_id = user.id,
                client_id = client.id,
                error = %e,
                "Email sent but interaction not recorded"
            );
            None
        }
    };

    events::award(&state, user.id, MilestoneKind::FirstEmail).await;

    Ok(Json(SendEmailResponse {
        sent: true,
        interaction,
    }))
}
