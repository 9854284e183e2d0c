//! User repository.
//!
//! Every write is a single-document update so it is atomic on its own.
//! Multi-step flows (checkout) are composed by the services.

use chrono::Utc;
use serde_json::Value;

use emporium_core::{
    Address, AddressRole, Email, LineItem, Order, OrderId, Price, ProductId, UserId,
};

use super::query::{Collection, Filter, ID_FIELD, Mutation, Stage, UpdateOutcome};
use super::store::{DocumentStore, StoreError};
use super::{RepositoryError, decode, encode};
use crate::models::User;

const CART: &str = "cart";
const ORDERS: &str = "orders";
const ADDRESSES: &str = "addresses";

fn address_path(role: AddressRole) -> String {
    format!("{ADDRESSES}.{role}")
}

/// Repository for user documents.
pub struct UserRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the document is invalid.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.store
            .find_by_id(Collection::Users, &id.to_string())
            .await?
            .map(decode)
            .transpose()
    }

    /// Get a user by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the document is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let found = self
            .store
            .find_many(Collection::Users, &Filter::all().eq("email", email.as_str()))
            .await?;
        found.into_iter().next().map(decode).transpose()
    }

    /// Whether any user already registered this phone number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    pub async fn phone_in_use(&self, phone: &str) -> Result<bool, RepositoryError> {
        let found = self
            .store
            .find_many(Collection::Users, &Filter::all().eq("phone", phone))
            .await?;
        Ok(!found.is_empty())
    }

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the ID or email already exists.
    /// Returns `RepositoryError::Store` for other store errors.
    pub async fn create(&self, user: &User) -> Result<(), RepositoryError> {
        let document = encode(user)?;
        self.store
            .insert_one(Collection::Users, document)
            .await
            .map_err(|e| match e {
                StoreError::DuplicateKey(_) => {
                    RepositoryError::Conflict("email already exists".to_owned())
                }
                other => RepositoryError::Store(other),
            })?;
        Ok(())
    }

    /// Persist a freshly issued token pair.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Store` for other store errors.
    pub async fn store_tokens(
        &self,
        id: UserId,
        token: &str,
        refresh_token: &str,
    ) -> Result<(), RepositoryError> {
        let updated_at = encode(&Utc::now())?;
        let outcome = self
            .store
            .update_one(
                Collection::Users,
                &Filter::by_id(id),
                &[
                    Mutation::set("token", token),
                    Mutation::set("refresh_token", refresh_token),
                    Mutation::set("updated_at", updated_at),
                ],
            )
            .await?;
        require_match(outcome)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Append a line item to the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn push_cart_item(&self, id: UserId, item: &LineItem) -> Result<(), RepositoryError> {
        let outcome = self
            .store
            .update_one(
                Collection::Users,
                &Filter::by_id(id),
                &[Mutation::push(CART, vec![encode(item)?])],
            )
            .await?;
        require_match(outcome)
    }

    /// Remove every line item for the product. Returns how many documents
    /// changed (0 when the cart held no such item).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn pull_cart_product(
        &self,
        id: UserId,
        product_id: ProductId,
    ) -> Result<u64, RepositoryError> {
        let outcome = self
            .store
            .update_one(
                Collection::Users,
                &Filter::by_id(id),
                &[Mutation::pull(CART, "product_id", product_id.to_string())],
            )
            .await?;
        require_match(outcome)?;
        Ok(outcome.modified)
    }

    /// Sum of the cart's line-item prices, computed by the store.
    ///
    /// An empty cart produces no group, which is a total of zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the pipeline fails.
    /// Returns `RepositoryError::DataCorruption` if the sum is not an integer.
    pub async fn cart_total(&self, id: UserId) -> Result<Price, RepositoryError> {
        let rows = self
            .store
            .aggregate(
                Collection::Users,
                &[
                    Stage::Match(Filter::by_id(id)),
                    Stage::Unwind(CART.to_owned()),
                    Stage::GroupSum {
                        key: ID_FIELD.to_owned(),
                        sum: format!("{CART}.price"),
                        output: "total".to_owned(),
                    },
                ],
            )
            .await?;

        let Some(row) = rows.into_iter().next() else {
            return Ok(Price::ZERO);
        };
        row.get("total")
            .and_then(Value::as_i64)
            .map(Price::from_minor)
            .ok_or_else(|| RepositoryError::DataCorruption(format!("invalid cart total: {row}")))
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn clear_cart(&self, id: UserId) -> Result<(), RepositoryError> {
        let outcome = self
            .store
            .update_one(
                Collection::Users,
                &Filter::by_id(id),
                &[Mutation::set(CART, Value::Array(Vec::new()))],
            )
            .await?;
        require_match(outcome)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Append an order to the history.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn push_order(&self, id: UserId, order: &Order) -> Result<(), RepositoryError> {
        let outcome = self
            .store
            .update_one(
                Collection::Users,
                &Filter::by_id(id),
                &[Mutation::push(ORDERS, vec![encode(order)?])],
            )
            .await?;
        require_match(outcome)
    }

    /// Copy line items into the order with this ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user or the order doesn't exist.
    pub async fn push_order_items(
        &self,
        id: UserId,
        order_id: OrderId,
        items: &[LineItem],
    ) -> Result<(), RepositoryError> {
        let values = items.iter().map(encode).collect::<Result<Vec<_>, _>>()?;
        let outcome = self
            .store
            .update_one(
                Collection::Users,
                &Filter::by_id(id).eq(format!("{ORDERS}.id"), order_id.to_string()),
                &[Mutation::PushInto {
                    path: ORDERS.to_owned(),
                    key: "id".to_owned(),
                    value: Value::String(order_id.to_string()),
                    target: "items".to_owned(),
                    values,
                }],
            )
            .await?;
        require_match(outcome)
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Store an address in a role only if that role is vacant.
    ///
    /// Returns `false` when the role was already taken (or the user doesn't
    /// exist); the vacancy check and the write are one update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the update fails.
    pub async fn claim_address(
        &self,
        id: UserId,
        role: AddressRole,
        address: &Address,
    ) -> Result<bool, RepositoryError> {
        let path = address_path(role);
        let outcome = self
            .store
            .update_one(
                Collection::Users,
                &Filter::by_id(id).exists(path.clone(), false),
                &[Mutation::set(path, encode(address)?)],
            )
            .await?;
        Ok(outcome.matched > 0)
    }

    /// Overwrite the address in an occupied role.
    ///
    /// Returns `false` when the role is vacant (or the user doesn't exist).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the update fails.
    pub async fn replace_address(
        &self,
        id: UserId,
        role: AddressRole,
        address: &Address,
    ) -> Result<bool, RepositoryError> {
        let path = address_path(role);
        let outcome = self
            .store
            .update_one(
                Collection::Users,
                &Filter::by_id(id).exists(path.clone(), true),
                &[Mutation::set(path, encode(address)?)],
            )
            .await?;
        Ok(outcome.matched > 0)
    }

    /// Remove every address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn clear_addresses(&self, id: UserId) -> Result<(), RepositoryError> {
        let outcome = self
            .store
            .update_one(
                Collection::Users,
                &Filter::by_id(id),
                &[Mutation::set(ADDRESSES, Value::Object(serde_json::Map::new()))],
            )
            .await?;
        require_match(outcome)
    }
}

const fn require_match(outcome: UpdateOutcome) -> Result<(), RepositoryError> {
    if outcome.matched == 0 {
        Err(RepositoryError::NotFound)
    } else {
        Ok(())
    }
}
