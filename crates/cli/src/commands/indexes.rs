//! Create the MongoDB indexes the storefront relies on.

use tracing::info;

use emporium_storefront::config::{StoreBackend, StoreConfig};
use emporium_storefront::db::MongoStore;

/// Create the unique email index and the lookup indexes.
///
/// # Errors
///
/// Returns an error if the store is not MongoDB or the indexes cannot be
/// created.
pub async fn create() -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env_only()?;
    if config.backend != StoreBackend::Mongo {
        return Err("indexes only apply to the MongoDB store (STOREFRONT_STORE=mongo)".into());
    }

    let store = MongoStore::connect(&config.uri, &config.database).await?;
    store.ensure_indexes().await?;

    info!(database = %config.database, "Indexes created");
    Ok(())
}
