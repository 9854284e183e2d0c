//! Document store interface.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::query::{Collection, Filter, Mutation, Stage, UpdateOutcome};

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a document store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or rejected the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A unique constraint (`_id` or an index) was violated.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// A document could not be converted to or from the backend format.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Interface for document persistence.
///
/// Implementations:
/// - `MongoStore`: MongoDB collections
/// - `MemoryStore`: in-process maps, for tests and local development
///
/// Documents are JSON objects carrying their identity in `_id`. Every method
/// is a single round trip; callers compose multi-step operations themselves.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by `_id`.
    async fn find_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Value>>;

    /// Fetch every document matching the filter, in insertion order.
    async fn find_many(&self, collection: Collection, filter: &Filter) -> StoreResult<Vec<Value>>;

    /// Insert a document and return its `_id`.
    async fn insert_one(&self, collection: Collection, document: Value) -> StoreResult<String>;

    /// Apply mutations to the first document matching the filter.
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        mutations: &[Mutation],
    ) -> StoreResult<UpdateOutcome>;

    /// Apply mutations to every document matching the filter.
    async fn update_many(
        &self,
        collection: Collection,
        filter: &Filter,
        mutations: &[Mutation],
    ) -> StoreResult<UpdateOutcome>;

    /// Run an aggregation pipeline.
    async fn aggregate(&self, collection: Collection, pipeline: &[Stage]) -> StoreResult<Vec<Value>>;

    /// Check connectivity.
    async fn ping(&self) -> StoreResult<()>;
}
