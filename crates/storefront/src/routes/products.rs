//! Admin product routes.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use emporium_core::Product;

use crate::error::Result;
use crate::middleware::Authenticated;
use crate::services::NewProduct;
use crate::state::AppState;

/// Add a product to the catalog.
#[instrument(skip(state, auth, input), fields(user_id = %auth.0.uid))]
pub async fn add_product(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(input): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.catalog().add(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}
