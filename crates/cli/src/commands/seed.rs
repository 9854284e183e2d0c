//! Seed the product catalog from a YAML file.
//!
//! The file is a list of products with the price in minor units:
//!
//! ```yaml
//! - name: Copper Kettle
//!   price: 2500
//!   rating: 4
//!   image: kettle.png
//! ```
//!
//! Products whose name is already in the catalog are skipped, so the command
//! can be re-run safely.

use std::path::Path;

use tracing::{info, warn};

use emporium_storefront::config::StoreConfig;
use emporium_storefront::db::{self, DocumentStore, ProductRepository};
use emporium_storefront::services::{CatalogService, Deadlines, NewProduct};

/// Outcome of a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Seed products from a YAML file into the configured store.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the store
/// fails.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Parse before connecting so a bad file fails fast
    let content = tokio::fs::read_to_string(path).await?;
    let products = parse_products(&content)?;
    info!(products = products.len(), "Parsed catalog");

    let config = StoreConfig::from_env_only()?;
    let store = db::open_store(&config).await?;

    let summary = seed(store.as_ref(), products).await?;
    info!(
        inserted = summary.inserted,
        skipped = summary.skipped,
        "Seeding complete"
    );
    Ok(())
}

/// Parse a YAML product list.
///
/// # Errors
///
/// Returns an error if the YAML does not describe a list of products.
pub fn parse_products(content: &str) -> Result<Vec<NewProduct>, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Insert every product whose name is not yet in the catalog.
///
/// # Errors
///
/// Returns an error if a product is invalid or the store fails.
pub async fn seed(
    store: &dyn DocumentStore,
    products: Vec<NewProduct>,
) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let existing = ProductRepository::new(store);
    let catalog = CatalogService::new(store, Deadlines::default().account);
    let mut summary = SeedSummary::default();

    for product in products {
        let name = product.name.trim().to_owned();
        if !existing.find_by_name(&name).await?.is_empty() {
            warn!(%name, "Product already exists, skipping");
            summary.skipped += 1;
            continue;
        }

        let created = catalog.add(product).await?;
        info!(product_id = %created.id, %name, "Inserted product");
        summary.inserted += 1;
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_storefront::db::MemoryStore;

    use super::*;

    const CATALOG: &str = r"
- name: Copper Kettle
  price: 2500
  rating: 4
  image: kettle.png
- name: Toaster
  price: 3000
";

    #[test]
    fn test_parse_products() {
        let products = parse_products(CATALOG).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].price.minor_units(), 2500);
        assert_eq!(products[1].rating, None);
        assert!(products[1].image.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_list() {
        assert!(parse_products("name: Kettle").is_err());
    }

    #[tokio::test]
    async fn test_seed_skips_existing_names() {
        let store = MemoryStore::new();

        let first = seed(&store, parse_products(CATALOG).unwrap()).await.unwrap();
        assert_eq!(first, SeedSummary { inserted: 2, skipped: 0 });

        let second = seed(&store, parse_products(CATALOG).unwrap()).await.unwrap();
        assert_eq!(second, SeedSummary { inserted: 0, skipped: 2 });

        assert_eq!(ProductRepository::new(&store).list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_seed_rejects_negative_price() {
        let store = MemoryStore::new();
        let products = parse_products("- name: Refund\n  price: -5\n").unwrap();
        assert!(seed(&store, products).await.is_err());
    }
}
