//! Product catalog repository.

use emporium_core::{Product, ProductId};

use super::query::{Collection, Filter};
use super::store::{DocumentStore, StoreError};
use super::{RepositoryError, decode, encode};

/// Repository for catalog products.
pub struct ProductRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the document is invalid.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.store
            .find_by_id(Collection::Products, &id.to_string())
            .await?
            .map(decode)
            .transpose()
    }

    /// All products, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if any document is invalid.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        self.find(&Filter::all()).await
    }

    /// Products whose name contains `query`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, RepositoryError> {
        self.find(&Filter::all().contains("name", query)).await
    }

    /// Products with exactly this name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<Product>, RepositoryError> {
        self.find(&Filter::all().eq("name", name)).await
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the ID already exists.
    /// Returns `RepositoryError::Store` for other store errors.
    pub async fn create(&self, product: &Product) -> Result<(), RepositoryError> {
        self.store
            .insert_one(Collection::Products, encode(product)?)
            .await
            .map_err(|e| match e {
                StoreError::DuplicateKey(key) => RepositoryError::Conflict(key),
                other => RepositoryError::Store(other),
            })?;
        Ok(())
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Product>, RepositoryError> {
        self.store
            .find_many(Collection::Products, filter)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::test_support::sample_product;

    #[tokio::test]
    async fn test_search_matches_substring() {
        let store = MemoryStore::new();
        let repo = ProductRepository::new(&store);
        for (name, price) in [("Trail Runner", 8900), ("Road Runner", 7900), ("Kettle", 2500)] {
            repo.create(&sample_product(name, price)).await.unwrap();
        }

        let found = repo.search("runner").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(repo.list().await.unwrap().len(), 3);
        assert_eq!(repo.find_by_name("Kettle").await.unwrap().len(), 1);
        assert!(repo.find_by_name("kettle").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_round_trips() {
        let store = MemoryStore::new();
        let repo = ProductRepository::new(&store);
        let product = sample_product("Kettle", 2500);
        repo.create(&product).await.unwrap();

        assert_eq!(repo.get(product.id).await.unwrap(), Some(product.clone()));
        assert_eq!(repo.get(ProductId::generate()).await.unwrap(), None);
        assert!(matches!(
            repo.create(&product).await.unwrap_err(),
            RepositoryError::Conflict(_)
        ));
    }
}
