//! Cart mutation and aggregation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use emporium_core::{LineItem, Price, ProductId, UserId};

use super::{CommerceError, UserLocks, within};
use crate::db::{DocumentStore, ProductRepository, UserRepository};

/// A cart's contents with the store-computed total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub total: Price,
    pub items: Vec<LineItem>,
}

/// Cart service.
pub struct CartService<'a> {
    users: UserRepository<'a>,
    products: ProductRepository<'a>,
    locks: &'a UserLocks,
    deadline: Duration,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, locks: &'a UserLocks, deadline: Duration) -> Self {
        Self {
            users: UserRepository::new(store),
            products: ProductRepository::new(store),
            locks,
            deadline,
        }
    }

    /// Snapshot a product into the user's cart.
    ///
    /// The line item copies the product's current price; later catalog
    /// changes do not affect it. Adding the same product twice adds two items.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::ProductNotFound` if the product doesn't exist.
    /// Returns `CommerceError::UserNotFound` if the user doesn't exist.
    #[instrument(skip(self), fields(product_id = %product_id, user_id = %user_id))]
    pub async fn add(&self, product_id: ProductId, user_id: UserId) -> Result<LineItem, CommerceError> {
        within(self.deadline, async {
            let _guard = self.locks.acquire(user_id).await;

            let product = self
                .products
                .get(product_id)
                .await?
                .ok_or(CommerceError::ProductNotFound)?;
            let item = product.snapshot();

            self.users.push_cart_item(user_id, &item).await?;
            tracing::info!(price = %item.price, "Added product to cart");
            Ok(item)
        })
        .await
    }

    /// Remove every line item for the product. Absent products are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::UserNotFound` if the user doesn't exist.
    #[instrument(skip(self), fields(product_id = %product_id, user_id = %user_id))]
    pub async fn remove(&self, product_id: ProductId, user_id: UserId) -> Result<(), CommerceError> {
        within(self.deadline, async {
            let _guard = self.locks.acquire(user_id).await;

            let modified = self.users.pull_cart_product(user_id, product_id).await?;
            if modified == 0 {
                tracing::debug!("Product was not in cart");
            } else {
                tracing::info!("Removed product from cart");
            }
            Ok(())
        })
        .await
    }

    /// The cart's items and their total. An empty cart totals zero.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::UserNotFound` if the user doesn't exist.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn summary(&self, user_id: UserId) -> Result<CartSummary, CommerceError> {
        within(self.deadline, async {
            let _guard = self.locks.acquire(user_id).await;
            summarize(&self.users, user_id).await
        })
        .await
    }
}

/// Read a cart and total it through the store's aggregation pipeline.
///
/// Callers hold the user's lock so the items and the total agree.
pub(crate) async fn summarize(
    users: &UserRepository<'_>,
    user_id: UserId,
) -> Result<CartSummary, CommerceError> {
    let user = users.get(user_id).await?.ok_or(CommerceError::UserNotFound)?;
    let total = users.cart_total(user_id).await?;
    Ok(CartSummary {
        total,
        items: user.cart,
    })
}
