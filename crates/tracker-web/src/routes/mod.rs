//! Route handlers for the REST API.

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod clients;
pub mod export;
pub mod follow_ups;
pub mod health;
pub mod interactions;
pub mod journey;
pub mod notifications;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Clients
        .route(
            "/api/clients",
            get(clients::list_clients).post(clients::create_client),
        )
        .route("/api/clients/search", get(clients::search_clients))
        .route(
            "/api/clients/:id",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route("/api/clients/:id/send-email", post(clients::send_email))
        .route(
            "/api/clients/:id/interactions",
            get(clients::client_interactions),
        )
        // Interactions
        .route(
            "/api/interactions",
            get(interactions::list_interactions).post(interactions::create_interaction),
        )
        // Follow-ups
        .route(
            "/api/follow-ups",
            get(follow_ups::list_follow_ups).post(follow_ups::create_follow_up),
        )
        .route("/api/follow-ups/overdue", get(follow_ups::overdue))
        .route("/api/follow-ups/upcoming", get(follow_ups::upcoming))
        .route(
            "/api/follow-ups/:id",
            get(follow_ups::get_follow_up)
                .put(follow_ups::update_follow_up)
                .delete(follow_ups::delete_follow_up),
        )
        // Derived views
        .route("/api/notifications", get(notifications::reminders))
        .route("/api/analytics", get(analytics::analytics))
        .route("/api/journey", get(journey::journey))
        .route(
            "/api/journey/milestones/:kind/complete",
            post(journey::complete_milestone),
        )
        // Admin
        .route(
            "/api/admin/notifications",
            get(admin::list_notifications).post(admin::create_notification),
        )
        .route(
            "/api/admin/notifications/unread-count",
            get(admin::unread_count),
        )
        .route(
            "/api/admin/notifications/read-all",
            patch(admin::mark_all_read),
        )
        .route(
            "/api/admin/notifications/:id/read",
            patch(admin::mark_read),
        )
        .route(
            "/api/admin/notifications/:id",
            axum::routing::delete(admin::delete_notification),
        )
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/:id/role", patch(admin::change_role))
        // Export
        .route("/api/export/clients", get(export::export_clients))
        .route("/api/export/follow-ups", get(export::export_follow_ups))
}
