//! Error types for the REST API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use mailer::MailError;
use thiserror::Error;

/// Errors that can occur while handling a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Outbound email failed.
    #[error("Email error: {0}")]
    Mail(#[from] MailError),

    /// Malformed or missing input.
    #[error("{0}")]
    BadRequest(String),

    /// No valid session.
    #[error("Authentication required")]
    Unauthorized,

    /// Login attempt with an unknown email or wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Authenticated but not allowed.
    #[error("Insufficient permissions")]
    Forbidden,

    /// SMTP is not configured.
    #[error("Email sending is not configured")]
    EmailDisabled,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Database(DatabaseError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Database(DatabaseError::AlreadyExists { .. }) => StatusCode::CONFLICT,
            ApiError::Database(DatabaseError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Mail(MailError::InvalidAddress(_)) => StatusCode::BAD_REQUEST,
            ApiError::Mail(_) => StatusCode::BAD_GATEWAY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::EmailDisabled => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            ApiError::Database(DatabaseError::Validation(err)) => err.to_string(),
            ApiError::Database(DatabaseError::NotFound { entity, .. }) => {
                format!("{} not found", entity)
            }
            ApiError::Database(err @ DatabaseError::AlreadyExists { .. }) => err.to_string(),
            _ if status.is_server_error() => {
                tracing::error!(error = %self, "Request failed");
                if matches!(self, ApiError::Database(_) | ApiError::Internal(_)) {
                    "Internal server error".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use database::ValidationError;

    #[test]
    fn test_status_mapping() {
        let not_found = ApiError::Database(DatabaseError::NotFound {
            entity: "Client",
            id: "7".to_string(),
        });
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid = ApiError::Database(DatabaseError::Validation(ValidationError::Empty(
            "name".to_string(),
        )));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::EmailDisabled.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ApiError::Mail(MailError::Send("timeout".to_string())).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
