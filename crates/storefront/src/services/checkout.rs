//! Order materialization: checkout, instant buy and order history.

use std::time::Duration;

use tracing::instrument;

use emporium_core::{Order, ProductId, UserId};

use super::cart::summarize;
use super::{CommerceError, UserLocks, within};
use crate::db::{DocumentStore, ProductRepository, UserRepository};

/// Order service.
pub struct OrderService<'a> {
    users: UserRepository<'a>,
    products: ProductRepository<'a>,
    locks: &'a UserLocks,
    deadline: Duration,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, locks: &'a UserLocks, deadline: Duration) -> Self {
        Self {
            users: UserRepository::new(store),
            products: ProductRepository::new(store),
            locks,
            deadline,
        }
    }

    /// Turn the user's cart into an order and empty the cart.
    ///
    /// Steps, in order:
    /// 1. read the cart and its aggregated total
    /// 2. append an order header carrying that total
    /// 3. copy the cart's line items into that order
    /// 4. empty the cart
    ///
    /// An empty cart produces an order with a zero total and no items.
    ///
    /// The steps are separate writes. A failure stops the sequence, is
    /// logged with the step and order ID, and is returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::UserNotFound` if the user doesn't exist.
    /// Returns `CommerceError::StoreUnavailable` if any write fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn checkout(&self, user_id: UserId) -> Result<Order, CommerceError> {
        within(self.deadline, async {
            let _guard = self.locks.acquire(user_id).await;

            let cart = summarize(&self.users, user_id).await?;

            let mut order = Order::pending(cart.total);
            let order_id = order.id;

            self.users
                .push_order(user_id, &order)
                .await
                .inspect_err(|e| {
                    tracing::error!(step = "append_order", %order_id, error = %e, "Checkout step failed");
                })?;

            self.users
                .push_order_items(user_id, order_id, &cart.items)
                .await
                .inspect_err(|e| {
                    tracing::error!(step = "copy_items", %order_id, error = %e, "Checkout step failed");
                })?;

            self.users.clear_cart(user_id).await.inspect_err(|e| {
                tracing::error!(step = "clear_cart", %order_id, error = %e, "Checkout step failed");
            })?;

            order.items = cart.items;
            tracing::info!(%order_id, total = %order.total, items = order.items.len(), "Checkout complete");
            Ok(order)
        })
        .await
    }

    /// Order a single product directly, leaving the cart untouched.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::ProductNotFound` if the product doesn't exist.
    /// Returns `CommerceError::UserNotFound` if the user doesn't exist.
    #[instrument(skip(self), fields(product_id = %product_id, user_id = %user_id))]
    pub async fn instant_buy(&self, product_id: ProductId, user_id: UserId) -> Result<Order, CommerceError> {
        within(self.deadline, async {
            let product = self
                .products
                .get(product_id)
                .await?
                .ok_or(CommerceError::ProductNotFound)?;

            let order = Order::from_items(vec![product.snapshot()]);
            self.users.push_order(user_id, &order).await.inspect_err(|e| {
                tracing::error!(order_id = %order.id, error = %e, "Instant buy failed");
            })?;

            tracing::info!(order_id = %order.id, total = %order.total, "Instant buy complete");
            Ok(order)
        })
        .await
    }

    /// The user's order history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::UserNotFound` if the user doesn't exist.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Order>, CommerceError> {
        within(self.deadline, async {
            let user = self.users.get(user_id).await?.ok_or(CommerceError::UserNotFound)?;
            Ok(user.orders)
        })
        .await
    }
}
