//! Token authentication middleware and extractors.
//!
//! Protected routes run behind [`require_token`], which verifies the access
//! token in the `token` header and stores its claims in the request
//! extensions. Handlers pick the claims up with [`Authenticated`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use emporium_core::UserId;

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::AccessClaims;
use crate::state::AppState;

/// Header carrying the access token.
pub const TOKEN_HEADER: &str = "token";

/// Middleware that rejects requests without a valid access token.
///
/// # Errors
///
/// Returns 401 if the header is missing, the token is malformed, tampered
/// with, expired or a refresh token.
pub async fn require_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthorized("No authorization header provided".to_string()))?;

    let claims = state.tokens().verify_access(token)?;
    set_sentry_user(&claims.uid, Some(&claims.email));
    tracing::Span::current().record("user_id", tracing::field::display(claims.uid));

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Extractor for the verified claims of the calling user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(auth: Authenticated, Query(q): Query<UserQuery>) -> Result<Json<..>> {
///     let user_id = auth.acting_as(&q.id)?;
///     ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticated(pub AccessClaims);

impl Authenticated {
    /// Parse the user id a request acts on and check it belongs to the caller.
    ///
    /// # Errors
    ///
    /// Returns 400 if the id is malformed and 403 if it names another user.
    pub fn acting_as(&self, raw_user_id: &str) -> Result<UserId, AppError> {
        let user_id = UserId::parse(raw_user_id)?;
        if user_id != self.0.uid {
            tracing::warn!(
                caller = %self.0.uid,
                target_user = %user_id,
                "Rejected request for another user's data"
            );
            return Err(AppError::Forbidden(
                "Token does not grant access to this user".to_string(),
            ));
        }
        Ok(user_id)
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessClaims>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}
