//! Cart and order route handlers.
//!
//! Every handler acts on the user named in the query string, which must be
//! the user the access token was issued to.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use emporium_core::{LineItem, Order, ProductId};

use super::required;
use crate::error::Result;
use crate::middleware::Authenticated;
use crate::services::CartSummary;
use crate::state::AppState;

/// Query naming a product and the user whose cart it goes into.
#[derive(Debug, Deserialize)]
pub struct CartItemQuery {
    pub id: Option<String>,
    #[serde(rename = "userID")]
    pub user_id: Option<String>,
}

/// Query naming the acting user.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub id: Option<String>,
}

/// Query for an instant purchase.
#[derive(Debug, Deserialize)]
pub struct InstantBuyQuery {
    pub id: Option<String>,
    pub pid: Option<String>,
}

/// Confirmation of a cart change.
#[derive(Debug, Serialize)]
pub struct CartMessage {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<LineItem>,
}

/// Confirmation of a placed order.
#[derive(Debug, Serialize)]
pub struct OrderPlaced {
    pub message: &'static str,
    pub order: Order,
}

/// Add a product to the cart.
#[instrument(skip(state, auth))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<CartItemQuery>,
) -> Result<Json<CartMessage>> {
    let product_id = ProductId::parse(required(query.id.as_deref(), "id")?)?;
    let user_id = auth.acting_as(required(query.user_id.as_deref(), "userID")?)?;

    let item = state.cart().add(product_id, user_id).await?;
    Ok(Json(CartMessage {
        message: "Successfully added to the cart",
        item: Some(item),
    }))
}

/// Remove every line item for a product from the cart.
#[instrument(skip(state, auth))]
pub async fn remove_item(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<CartItemQuery>,
) -> Result<Json<CartMessage>> {
    let product_id = ProductId::parse(required(query.id.as_deref(), "id")?)?;
    let user_id = auth.acting_as(required(query.user_id.as_deref(), "userID")?)?;

    state.cart().remove(product_id, user_id).await?;
    Ok(Json(CartMessage {
        message: "Successfully removed from the cart",
        item: None,
    }))
}

/// Cart contents and total.
#[instrument(skip(state, auth))]
pub async fn list_cart(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<UserQuery>,
) -> Result<Json<CartSummary>> {
    let user_id = auth.acting_as(required(query.id.as_deref(), "id")?)?;
    Ok(Json(state.cart().summary(user_id).await?))
}

/// Turn the cart into an order.
#[instrument(skip(state, auth))]
pub async fn checkout(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<UserQuery>,
) -> Result<Json<OrderPlaced>> {
    let user_id = auth.acting_as(required(query.id.as_deref(), "id")?)?;
    let order = state.orders().checkout(user_id).await?;
    Ok(Json(OrderPlaced {
        message: "Successfully placed the order",
        order,
    }))
}

/// Order one product without touching the cart.
#[instrument(skip(state, auth))]
pub async fn instant_buy(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<InstantBuyQuery>,
) -> Result<Json<OrderPlaced>> {
    let user_id = auth.acting_as(required(query.id.as_deref(), "id")?)?;
    let product_id = ProductId::parse(required(query.pid.as_deref(), "pid")?)?;
    let order = state.orders().instant_buy(product_id, user_id).await?;
    Ok(Json(OrderPlaced {
        message: "Successfully placed the order",
        order,
    }))
}

/// Order history.
#[instrument(skip(state, auth))]
pub async fn list_orders(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<Order>>> {
    let user_id = auth.acting_as(required(query.id.as_deref(), "id")?)?;
    Ok(Json(state.orders().list(user_id).await?))
}
