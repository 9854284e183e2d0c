//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side failures to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; the body is always `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use emporium_core::IdError;

use crate::services::{AuthError, CommerceError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart, order, address or catalog operation failed.
    #[error("Commerce error: {0}")]
    Commerce(#[from] CommerceError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No valid access token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but acting on another user's data.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<IdError> for AppError {
    fn from(error: IdError) -> Self {
        Self::Commerce(error.into())
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Commerce(err) => commerce_status(err),
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_) | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::TokenExpired => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserAlreadyExists | AuthError::PhoneInUse => StatusCode::CONFLICT,
                AuthError::PasswordHash | AuthError::TokenSigning => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                AuthError::Commerce(inner) => commerce_status(inner),
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client.
    fn public_message(&self) -> String {
        // Don't expose internal error details to clients
        match self {
            Self::Commerce(err) | Self::Auth(AuthError::Commerce(err)) => commerce_message(err),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::PhoneInUse => "This phone number is already in use".to_string(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::Validation(msg) => msg.clone(),
                AuthError::InvalidToken => "Invalid token".to_string(),
                AuthError::TokenExpired => "Token has expired".to_string(),
                AuthError::PasswordHash | AuthError::TokenSigning | AuthError::Commerce(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

const fn commerce_status(err: &CommerceError) -> StatusCode {
    match err {
        CommerceError::InvalidIdentifier(_) | CommerceError::InvalidInput(_) => {
            StatusCode::BAD_REQUEST
        }
        CommerceError::UserNotFound
        | CommerceError::ProductNotFound
        | CommerceError::AddressNotFound(_) => StatusCode::NOT_FOUND,
        CommerceError::AddressLimitExceeded => StatusCode::CONFLICT,
        CommerceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        CommerceError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CommerceError::DataCorruption(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn commerce_message(err: &CommerceError) -> String {
    match err {
        CommerceError::StoreUnavailable(_) => "Service temporarily unavailable".to_string(),
        CommerceError::DataCorruption(_) => "Internal server error".to_string(),
        CommerceError::Timeout(_) => "Request timed out".to_string(),
        other => other.to_string(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
