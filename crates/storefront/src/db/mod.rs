//! Persistence for the storefront.
//!
//! # Collections
//!
//! - `Users` - one document per user, embedding the cart, the address book
//!   and the order history
//! - `Products` - the catalog
//!
//! Repositories ([`UserRepository`], [`ProductRepository`]) borrow a
//! [`DocumentStore`] and convert between documents and domain types. The
//! store itself is chosen at startup: MongoDB in production, the in-memory
//! backend for tests and local development.

pub mod memory;
pub mod mongo;
pub mod products;
pub mod query;
pub mod store;
pub mod users;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use products::ProductRepository;
pub use query::{Collection, Filter, Mutation, Stage, UpdateOutcome};
pub use store::{DocumentStore, StoreError, StoreResult};
pub use users::UserRepository;

use crate::config::{StoreBackend, StoreConfig};

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The document store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A stored document could not be decoded.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Open the configured document store.
///
/// For MongoDB this also creates the indexes, which is idempotent, so a
/// fresh database is usable without running the CLI first.
///
/// # Errors
///
/// Returns `StoreError::Unavailable` if the MongoDB client cannot be created
/// or the indexes cannot be built.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match config.backend {
        StoreBackend::Mongo => {
            let store = MongoStore::connect(&config.uri, &config.database).await?;
            store.ensure_indexes().await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Serialize a domain value into a store document.
pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Value, RepositoryError> {
    serde_json::to_value(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("failed to encode document: {e}")))
}

/// Decode a store document into a domain value.
pub(crate) fn decode<T: DeserializeOwned>(document: Value) -> Result<T, RepositoryError> {
    serde_json::from_value(document)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid document: {e}")))
}
