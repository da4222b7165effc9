//! API error types with HTTP response mapping.

use auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client (malformed id, unparsable input).
    BadRequest(String),
    /// Missing or unusable bearer token.
    Unauthorized,
    /// Domain logic error.
    Domain(DomainError),
    /// Identity and access error.
    Auth(AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "missing or invalid bearer token".to_string(),
            ),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Auth(err) => auth_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::InvalidQuantity { .. }
        | DomainError::InvalidRating { .. }
        | DomainError::MissingField { .. }
        | DomainError::UnknownItem { .. }
        | DomainError::AlreadyReviewed { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        DomainError::ItemNotFound { .. }
        | DomainError::OrderNotFound { .. }
        | DomainError::UserNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::OutOfStock { .. } | DomainError::InvalidTransition { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
        DomainError::Forbidden => (StatusCode::FORBIDDEN, err.to_string()),
        DomainError::Inconsistent { .. } | DomainError::Store(_) => {
            tracing::error!(error = %err, "internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            )
        }
    }
}

fn auth_error_to_response(err: AuthError) -> (StatusCode, String) {
    match &err {
        AuthError::InvalidCredentials | AuthError::Unauthorized => {
            (StatusCode::UNAUTHORIZED, err.to_string())
        }
        AuthError::InvalidOrExpiredToken
        | AuthError::PasswordTooShort { .. }
        | AuthError::InvalidEmail
        | AuthError::NameRequired
        | AuthError::EmailTaken => (StatusCode::BAD_REQUEST, err.to_string()),
        AuthError::Store(_) => {
            tracing::error!(error = %err, "internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}
