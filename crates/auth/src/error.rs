//! Auth error types.

use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the auth service.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password; the two are indistinguishable.
    #[error("incorrect email or password")]
    InvalidCredentials,

    /// Missing, unknown, or expired bearer token.
    #[error("missing or invalid bearer token")]
    Unauthorized,

    /// Unknown, already-consumed, or expired password-reset token.
    #[error("invalid or expired reset token")]
    InvalidOrExpiredToken,

    /// Password shorter than the minimum length.
    #[error("password must be at least {minimum} characters")]
    PasswordTooShort { minimum: usize },

    /// Malformed email address.
    #[error("invalid email address")]
    InvalidEmail,

    /// Display name is empty.
    #[error("name is required")]
    NameRequired,

    /// Another account already uses this email.
    #[error("email already registered")]
    EmailTaken,

    /// An error below the auth layer.
    #[error(transparent)]
    Store(#[from] StoreError),
}
