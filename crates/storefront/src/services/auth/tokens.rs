//! Signed access and refresh tokens.
//!
//! Tokens are HS256 JWTs. Access tokens carry the user's ID and profile
//! names; refresh tokens carry only the ID. The `kind` claim keeps a refresh
//! token from being accepted where an access token is expected.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use emporium_core::UserId;

use super::AuthError;
use crate::models::User;

/// Which use a token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims of an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub uid: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
}

/// Claims of a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub uid: UserId,
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
}

/// A freshly issued token pair.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// Issues and verifies tokens with one shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenIssuer {
    /// Create an issuer from the signing secret and token lifetimes.
    #[must_use]
    pub fn new(secret: &SecretString, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue an access/refresh pair for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue(&self, user: &User) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let iat = now.timestamp();

        let access = AccessClaims {
            uid: user.id,
            email: user.email.as_str().to_owned(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            kind: TokenKind::Access,
            exp: (now + self.access_ttl).timestamp(),
            iat,
        };
        let refresh = RefreshClaims {
            uid: user.id,
            kind: TokenKind::Refresh,
            exp: (now + self.refresh_ttl).timestamp(),
            iat,
        };

        Ok(TokenPair {
            token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
        })
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|_| AuthError::TokenSigning)
    }

    /// Verify an access token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` if the token has expired.
    /// Returns `AuthError::InvalidToken` for any other failure, including
    /// refresh tokens.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = jsonwebtoken::decode::<AccessClaims>(token, &self.decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })?;

        if data.claims.kind != TokenKind::Access {
            return Err(AuthError::InvalidToken);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::sample_user;

    fn issuer(access_hours: i64) -> TokenIssuer {
        TokenIssuer::new(
            &SecretString::from("k3y-for-tests-9f8a7b6c5d4e3f2a1b0c".to_string()),
            Duration::hours(access_hours),
            Duration::hours(168),
        )
    }

    #[test]
    fn test_access_token_round_trip() {
        let user = sample_user("ada@example.com", "5550100");
        let pair = issuer(24).issue(&user).unwrap();
        let claims = issuer(24).verify_access(&pair.token).unwrap();
        assert_eq!(claims.uid, user.id);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.first_name, user.first_name);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let user = sample_user("ada@example.com", "5550100");
        let pair = issuer(-1).issue(&user).unwrap();
        assert!(matches!(
            issuer(24).verify_access(&pair.token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let user = sample_user("ada@example.com", "5550100");
        let pair = issuer(24).issue(&user).unwrap();
        let other = TokenIssuer::new(
            &SecretString::from("another-k3y-entirely-0a1b2c3d4e5f6a7b".to_string()),
            Duration::hours(24),
            Duration::hours(168),
        );
        assert!(matches!(other.verify_access(&pair.token), Err(AuthError::InvalidToken)));
        assert!(matches!(
            issuer(24).verify_access("not.a.token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_refresh_token_does_not_authenticate() {
        let user = sample_user("ada@example.com", "5550100");
        let pair = issuer(24).issue(&user).unwrap();
        assert!(matches!(
            issuer(24).verify_access(&pair.refresh_token),
            Err(AuthError::InvalidToken)
        ));
    }
}
