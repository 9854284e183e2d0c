//! Address book route handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use emporium_core::{Address, AddressBook, AddressFields, AddressRole};

use super::cart::UserQuery;
use super::required;
use crate::error::Result;
use crate::middleware::Authenticated;
use crate::state::AppState;

/// The address stored by an add or edit.
#[derive(Debug, Serialize)]
pub struct StoredAddress {
    pub message: String,
    pub role: AddressRole,
    pub address: Address,
}

/// Add an address in the first vacant role.
#[instrument(skip(state, auth, fields))]
pub async fn add_address(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<UserQuery>,
    Json(fields): Json<AddressFields>,
) -> Result<(StatusCode, Json<StoredAddress>)> {
    let user_id = auth.acting_as(required(query.id.as_deref(), "id")?)?;
    let (role, address) = state.addresses().add(user_id, fields).await?;
    Ok((
        StatusCode::CREATED,
        Json(StoredAddress {
            message: format!("Successfully added the {role} address"),
            role,
            address,
        }),
    ))
}

/// The user's address book.
#[instrument(skip(state, auth))]
pub async fn list_addresses(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<UserQuery>,
) -> Result<Json<AddressBook>> {
    let user_id = auth.acting_as(required(query.id.as_deref(), "id")?)?;
    Ok(Json(state.addresses().list(user_id).await?))
}

/// Overwrite the home address.
pub async fn edit_home_address(
    state: State<AppState>,
    auth: Authenticated,
    query: Query<UserQuery>,
    fields: Json<AddressFields>,
) -> Result<Json<StoredAddress>> {
    edit_address(state, auth, query, fields, AddressRole::Home).await
}

/// Overwrite the work address.
pub async fn edit_work_address(
    state: State<AppState>,
    auth: Authenticated,
    query: Query<UserQuery>,
    fields: Json<AddressFields>,
) -> Result<Json<StoredAddress>> {
    edit_address(state, auth, query, fields, AddressRole::Work).await
}

#[instrument(skip(state, auth, fields))]
async fn edit_address(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<UserQuery>,
    Json(fields): Json<AddressFields>,
    role: AddressRole,
) -> Result<Json<StoredAddress>> {
    let user_id = auth.acting_as(required(query.id.as_deref(), "id")?)?;
    let address = state.addresses().edit(user_id, role, fields).await?;
    Ok(Json(StoredAddress {
        message: format!("Successfully updated the {role} address"),
        role,
        address,
    }))
}

/// Remove every address.
#[instrument(skip(state, auth))]
pub async fn delete_addresses(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<UserQuery>,
) -> Result<Json<serde_json::Value>> {
    let user_id = auth.acting_as(required(query.id.as_deref(), "id")?)?;
    state.addresses().delete_all(user_id).await?;
    Ok(Json(serde_json::json!({ "message": "Successfully deleted all addresses" })))
}
