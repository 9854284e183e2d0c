//! Product catalog.

use std::time::Duration;

use serde::Deserialize;
use tracing::instrument;

use emporium_core::{Price, Product, ProductId};

use super::{CommerceError, within};
use crate::db::{DocumentStore, ProductRepository};

/// Highest rating a product can carry.
pub const MAX_RATING: u8 = 5;

/// Highest accepted price. A cart of a million items at this price still
/// sums within `i64`, so store-side totals stay integral.
pub const MAX_PRICE: Price = Price::from_minor(i64::MAX / 1_000_000);

/// Fields for a new catalog product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    /// Price in minor units.
    pub price: Price,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub image: String,
}

/// Catalog service.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
    deadline: Duration,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, deadline: Duration) -> Self {
        Self {
            products: ProductRepository::new(store),
            deadline,
        }
    }

    /// Every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::StoreUnavailable` if the store fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Product>, CommerceError> {
        within(self.deadline, async { Ok(self.products.list().await?) }).await
    }

    /// Products whose name contains `query`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::InvalidInput` if the query is blank.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, CommerceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CommerceError::InvalidInput("search query is required".to_owned()));
        }
        within(self.deadline, async { Ok(self.products.search(query).await?) }).await
    }

    /// Add a product with a fresh ID.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::InvalidInput` for a blank name, a price
    /// below zero or above [`MAX_PRICE`], or an out-of-range rating.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn add(&self, input: NewProduct) -> Result<Product, CommerceError> {
        let name = input.name.trim().to_owned();
        if name.is_empty() {
            return Err(CommerceError::InvalidInput("product name is required".to_owned()));
        }
        if input.price.is_negative() {
            return Err(CommerceError::InvalidInput("price cannot be negative".to_owned()));
        }
        if input.price > MAX_PRICE {
            return Err(CommerceError::InvalidInput(format!(
                "price cannot exceed {} minor units",
                MAX_PRICE.minor_units()
            )));
        }
        if input.rating.is_some_and(|rating| rating > MAX_RATING) {
            return Err(CommerceError::InvalidInput(format!(
                "rating must be between 0 and {MAX_RATING}"
            )));
        }

        let product = Product {
            id: ProductId::generate(),
            name,
            price: input.price,
            rating: input.rating,
            image: input.image.trim().to_owned(),
        };

        within(self.deadline, async {
            self.products.create(&product).await?;
            tracing::info!(product_id = %product.id, price = %product.price, "Product added");
            Ok(product)
        })
        .await
    }
}
