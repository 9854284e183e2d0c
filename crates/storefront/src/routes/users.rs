//! Public account and catalog routes.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use emporium_core::Product;

use super::required;
use crate::error::Result;
use crate::services::auth::{LoginRequest, SignUpRequest, SignedIn};
use crate::state::AppState;

/// Query for product search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
}

/// Register a new account.
#[instrument(skip_all)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<SignedIn>)> {
    let signed_in = state.auth().sign_up(request).await?;
    Ok((StatusCode::CREATED, Json(signed_in)))
}

/// Log in with email and password.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SignedIn>> {
    Ok(Json(state.auth().login(request).await?))
}

/// List every product.
#[instrument(skip(state))]
pub async fn product_view(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().list().await?))
}

/// Search products by name.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Product>>> {
    let name = required(query.name.as_deref(), "name")?;
    Ok(Json(state.catalog().search(name).await?))
}
