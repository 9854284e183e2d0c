//! Orders materialized from carts or instant purchases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::OrderId;
use super::price::Price;
use super::product::LineItem;

/// How an order will be paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Paid online. Not offered by the storefront yet.
    Digital,
    /// Paid on delivery; every order placed through the storefront.
    #[default]
    CashOnDelivery,
}

/// An order in a user's history.
///
/// Orders are appended to the user document and never modified once their
/// item list has been written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub ordered_at: DateTime<Utc>,
    /// Sum of the item prices at creation time.
    pub total: Price,
    pub payment: PaymentMethod,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl Order {
    /// Create an order header with no items yet.
    ///
    /// Checkout appends the header first and then copies the cart into it,
    /// so the total is fixed before the items are written.
    #[must_use]
    pub fn pending(total: Price) -> Self {
        Self {
            id: OrderId::generate(),
            ordered_at: Utc::now(),
            total,
            payment: PaymentMethod::CashOnDelivery,
            items: Vec::new(),
        }
    }

    /// Create a complete order whose total is derived from its items.
    #[must_use]
    pub fn from_items(items: Vec<LineItem>) -> Self {
        let total = items.iter().map(|item| item.price).sum();
        Self {
            items,
            ..Self::pending(total)
        }
    }
}
