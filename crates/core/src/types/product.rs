//! Catalog products and the line items copied from them.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A catalog product.
///
/// Products are immutable once inserted; there is no update path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Document ID.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Display name, searched by `/users/search`.
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Optional rating out of 5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    /// Image URL or asset path.
    #[serde(default)]
    pub image: String,
}

impl Product {
    /// Copy the fields a cart or order needs into a [`LineItem`].
    ///
    /// The copy is detached from the catalog: if the product's price changes
    /// later, line items already in carts or orders keep the price they were
    /// added at.
    #[must_use]
    pub fn snapshot(&self) -> LineItem {
        LineItem {
            product_id: self.id,
            name: self.name.clone(),
            price: self.price,
            rating: self.rating,
            image: self.image.clone(),
            quantity: 1,
        }
    }
}

/// A price-snapshotted product in a cart or an order.
///
/// Adding the same product twice yields two line items, each with quantity 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The product this item was copied from.
    pub product_id: ProductId,
    /// Product name at the time of adding.
    pub name: String,
    /// Product price at the time of adding.
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default)]
    pub image: String,
    /// Always 1; carts never coalesce duplicate products.
    pub quantity: u32,
}
