//! Fixtures shared by unit tests.
#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use emporium_core::{Email, Price, Product, ProductId};

use crate::db::{
    Collection, DocumentStore, Filter, MemoryStore, Mutation, ProductRepository, Stage, StoreError,
    StoreResult, UpdateOutcome, UserRepository,
};
use crate::models::{NewUser, User};

pub fn sample_user(email: &str, phone: &str) -> User {
    User::create(NewUser {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: Email::parse(email).unwrap(),
        phone: phone.to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
    })
}

pub fn sample_product(name: &str, price: i64) -> Product {
    Product {
        id: ProductId::generate(),
        name: name.to_string(),
        price: Price::from_minor(price),
        rating: Some(4),
        image: format!("{}.png", name.to_lowercase()),
    }
}

pub async fn insert_user(store: &dyn DocumentStore, email: &str) -> User {
    let user = sample_user(email, "5550100");
    UserRepository::new(store).create(&user).await.unwrap();
    user
}

pub async fn insert_product(store: &dyn DocumentStore, name: &str, price: i64) -> Product {
    let product = sample_product(name, price);
    ProductRepository::new(store).create(&product).await.unwrap();
    product
}

/// A `MemoryStore` whose Nth `update_one` (1-based) fails as unavailable.
///
/// Reads and every other write pass through, so tests can inspect exactly
/// what a multi-step operation left behind.
#[derive(Debug)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_on: usize,
    updates: AtomicUsize,
}

impl FailingStore {
    pub fn new(inner: MemoryStore, fail_on: usize) -> Self {
        Self {
            inner,
            fail_on,
            updates: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn find_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Value>> {
        self.inner.find_by_id(collection, id).await
    }

    async fn find_many(&self, collection: Collection, filter: &Filter) -> StoreResult<Vec<Value>> {
        self.inner.find_many(collection, filter).await
    }

    async fn insert_one(&self, collection: Collection, document: Value) -> StoreResult<String> {
        self.inner.insert_one(collection, document).await
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        mutations: &[Mutation],
    ) -> StoreResult<UpdateOutcome> {
        let attempt = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt == self.fail_on {
            return Err(StoreError::Unavailable(format!("update {attempt} refused")));
        }
        self.inner.update_one(collection, filter, mutations).await
    }

    async fn update_many(
        &self,
        collection: Collection,
        filter: &Filter,
        mutations: &[Mutation],
    ) -> StoreResult<UpdateOutcome> {
        self.inner.update_many(collection, filter, mutations).await
    }

    async fn aggregate(&self, collection: Collection, pipeline: &[Stage]) -> StoreResult<Vec<Value>> {
        self.inner.aggregate(collection, pipeline).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}
