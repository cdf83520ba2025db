//! REST API server for Tracker Suite.
//!
//! Serves client records, follow-ups, interactions, derived reminders,
//! analytics, journey progress and the admin notification inbox over JSON,
//! authenticated with a session cookie.

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod routes;
pub mod state;

use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use config::{Config, ConfigError};
pub use error::ApiError;
pub use state::{AppState, PasswordHashing, Settings};

/// Build the application with its middleware stack.
///
/// When a static directory is configured, unknown paths fall through to it
/// and then to its `index.html` so client-side routes resolve.
pub fn app(state: AppState) -> Router {
    let settings = state.settings.clone();

    let mut router = routes::router();

    if let Some(dir) = &settings.static_dir {
        let index = ServeFile::new(dir.join("index.html"));
        router = router.fallback_service(ServeDir::new(dir).not_found_service(index));
    }

    router
        .layer(CookieManagerLayer::new())
        .layer(TimeoutLayer::new(settings.request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
