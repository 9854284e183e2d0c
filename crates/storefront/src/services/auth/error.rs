//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::CommerceError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] emporium_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Phone number registered to another account.
    #[error("phone number already in use")]
    PhoneInUse,

    /// A signup field failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Token missing, malformed, tampered with or of the wrong kind.
    #[error("invalid token")]
    InvalidToken,

    /// Token signature is valid but it has expired.
    #[error("token expired")]
    TokenExpired,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token could not be signed.
    #[error("token signing error")]
    TokenSigning,

    /// Store failure or deadline while handling the request.
    #[error(transparent)]
    Commerce(#[from] CommerceError),
}

impl From<RepositoryError> for AuthError {
    fn from(error: RepositoryError) -> Self {
        Self::Commerce(error.into())
    }
}
