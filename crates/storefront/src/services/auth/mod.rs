//! Authentication service.
//!
//! Password signup and login. Successful calls issue a fresh access/refresh
//! token pair and persist it on the user document.

mod error;
pub mod tokens;

pub use error::AuthError;
pub use tokens::{AccessClaims, TokenIssuer, TokenPair};

use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use emporium_core::Email;

use crate::db::{DocumentStore, RepositoryError, UserRepository};
use crate::models::{NewUser, User, UserProfile};
use crate::services::within;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length (bounds hashing cost).
const MAX_PASSWORD_LENGTH: usize = 128;
/// Name length bounds, in characters.
const MIN_NAME_LENGTH: usize = 2;
const MAX_NAME_LENGTH: usize = 30;
/// Phone length bounds, in digits.
const MAX_PHONE_LENGTH: usize = 15;

/// Signup form.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

/// Login form.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A signed-in user and their tokens.
#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    pub user: UserProfile,
    pub token: String,
    pub refresh_token: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenIssuer,
    deadline: Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, tokens: &'a TokenIssuer, deadline: Duration) -> Self {
        Self {
            users: UserRepository::new(store),
            tokens,
            deadline,
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if a field doesn't meet requirements.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    /// Returns `AuthError::PhoneInUse` if the phone is already registered.
    #[instrument(skip_all)]
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<SignedIn, AuthError> {
        let first_name = validate_name("first_name", &request.first_name)?;
        let last_name = validate_name("last_name", &request.last_name)?;
        let email = Email::parse(&request.email)?;
        validate_password(&request.password)?;
        let phone = validate_phone(&request.phone)?;

        within(self.deadline, async {
            if self.users.get_by_email(&email).await?.is_some() {
                tracing::warn!("Signup rejected: email already registered");
                return Err(AuthError::UserAlreadyExists);
            }
            if self.users.phone_in_use(&phone).await? {
                tracing::warn!("Signup rejected: phone already registered");
                return Err(AuthError::PhoneInUse);
            }

            let password_hash = hash_password(&request.password)?;
            let mut user = User::create(NewUser {
                first_name,
                last_name,
                email,
                phone,
                password_hash,
            });
            let pair = self.tokens.issue(&user)?;
            user.token = Some(pair.token.clone());
            user.refresh_token = Some(pair.refresh_token.clone());

            // The unique email index catches a concurrent signup that slipped
            // past the lookup above.
            self.users.create(&user).await.map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => other.into(),
            })?;

            tracing::info!(user_id = %user.id, "User signed up");
            Ok(SignedIn {
                user: user.profile(),
                token: pair.token,
                refresh_token: pair.refresh_token,
            })
        })
        .await
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip_all)]
    pub async fn login(&self, request: LoginRequest) -> Result<SignedIn, AuthError> {
        // A malformed email can't belong to an account.
        let email = Email::parse(&request.email).map_err(|_| AuthError::InvalidCredentials)?;

        within(self.deadline, async {
            let user = self
                .users
                .get_by_email(&email)
                .await?
                .ok_or(AuthError::InvalidCredentials)?;
            verify_password(&request.password, &user.password_hash)?;

            let pair = self.tokens.issue(&user)?;
            self.users
                .store_tokens(user.id, &pair.token, &pair.refresh_token)
                .await?;

            tracing::info!(user_id = %user.id, "User logged in");
            Ok(SignedIn {
                user: user.profile(),
                token: pair.token,
                refresh_token: pair.refresh_token,
            })
        })
        .await
    }
}

/// Validate a first or last name.
fn validate_name(field: &str, value: &str) -> Result<String, AuthError> {
    let value = value.trim();
    let length = value.chars().count();
    if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&length) {
        return Err(AuthError::Validation(format!(
            "{field} must be {MIN_NAME_LENGTH}-{MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(value.to_owned())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a phone number: digits only.
fn validate_phone(phone: &str) -> Result<String, AuthError> {
    let phone = phone.trim();
    if phone.is_empty() || phone.len() > MAX_PHONE_LENGTH || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AuthError::Validation(format!(
            "phone must be 1-{MAX_PHONE_LENGTH} digits"
        )));
    }
    Ok(phone.to_owned())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
