//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;
use crate::db::RepositoryError;
use crate::places::PlacesError;
use crate::services::oauth::OAuthError;
use crate::storage::StorageError;

/// Application-level error type for the site.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Google Places API operation failed.
    #[error("Places error: {0}")]
    Places(#[from] PlacesError),

    /// Image storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// OAuth sign-in failed.
    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    /// Configuration is missing or invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but lacks the capability.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An upstream operation did not finish in time.
    #[error("Timed out: {0}")]
    Timeout(&'static str),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Places(PlacesError::InvalidInput(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Places(PlacesError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Places(PlacesError::RateLimited(_)) | Self::RateLimited => {
                StatusCode::TOO_MANY_REQUESTS
            }
            Self::Places(PlacesError::NotConfigured)
            | Self::Storage(StorageError::NotConfigured)
            | Self::Database(_)
            | Self::Config(_)
            | Self::Session(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Places(_) | Self::Storage(_) | Self::OAuth(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Message safe to show to clients.
    ///
    /// Server-side failures get a generic message; details only go to logs
    /// and Sentry.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => format!("Conflict: {msg}"),
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Config(_) => "Service not configured".to_string(),
            Self::Places(PlacesError::InvalidInput(msg)) => msg.clone(),
            Self::Places(PlacesError::NotFound(_)) => "Place not found".to_string(),
            Self::Places(PlacesError::NotConfigured) => "Places API not configured".to_string(),
            Self::Storage(StorageError::NotConfigured) => {
                "Image storage not configured".to_string()
            }
            Self::Places(_) | Self::Storage(_) | Self::OAuth(_) => {
                "External service error".to_string()
            }
            Self::Timeout(what) => format!("Timed out while {what}"),
            _ => self.to_string(),
        }
    }

    /// Log and capture server-side errors to Sentry.
    pub fn report(&self) {
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();

        let status = self.status();
        let body = Json(json!({ "error": self.public_message() }));

        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after sign-in.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("listing 123".to_string());
        assert_eq!(err.to_string(), "Not found: listing 123");

        let err = AppError::BadRequest("address is required".to_string());
        assert_eq!(err.to_string(), "Bad request: address is required");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Timeout("loading listing")),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            get_status(AppError::Places(PlacesError::NotConfigured)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Places(PlacesError::Upstream {
                status: 500,
                body: String::new()
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "invalid created_by on listing 7".to_string(),
        ));
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::Storage(StorageError::Upstream {
            status: 403,
            body: "service key rejected".to_string(),
        });
        assert_eq!(err.public_message(), "External service error");
    }
}
