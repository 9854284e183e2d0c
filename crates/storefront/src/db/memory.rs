//! In-process document store.
//!
//! Mirrors the MongoDB semantics the repositories rely on: dotted paths,
//! `$push` with `$each`, `$pull` by element key, array-filtered pushes,
//! `$unwind` dropping empty arrays and `$group` with `$sum` ignoring
//! non-numeric values. Every update is applied to a copy of the document and
//! swapped in whole, so a failing mutation leaves the document untouched.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Number, Value};
use tokio::sync::RwLock;

use super::query::{Collection, Condition, Filter, ID_FIELD, Mutation, Stage, UpdateOutcome};
use super::store::{DocumentStore, StoreError, StoreResult};

/// Document store backed by in-memory vectors.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn update(
        &self,
        collection: Collection,
        filter: &Filter,
        mutations: &[Mutation],
        many: bool,
    ) -> StoreResult<UpdateOutcome> {
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection).or_default();

        let mut outcome = UpdateOutcome::default();
        for document in documents.iter_mut() {
            if !matches(document, filter) {
                continue;
            }
            outcome.matched += 1;

            let mut updated = document.clone();
            let mut changed = false;
            for mutation in mutations {
                changed |= apply(&mut updated, mutation)?;
            }
            if changed {
                *document = updated;
                outcome.modified += 1;
            }

            if !many {
                break;
            }
        }

        Ok(outcome)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).and_then(|documents| {
            documents
                .iter()
                .find(|doc| doc.get(ID_FIELD).and_then(Value::as_str) == Some(id))
                .cloned()
        }))
    }

    async fn find_many(&self, collection: Collection, filter: &Filter) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|doc| matches(doc, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_one(&self, collection: Collection, document: Value) -> StoreResult<String> {
        let id = document
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| StoreError::InvalidDocument("document has no string _id".to_owned()))?;

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection).or_default();
        if documents
            .iter()
            .any(|doc| doc.get(ID_FIELD).and_then(Value::as_str) == Some(id.as_str()))
        {
            return Err(StoreError::DuplicateKey(format!(
                "{}._id {id}",
                collection.name()
            )));
        }

        for field in unique_fields(collection) {
            let Some(value) = document.get(*field) else {
                continue;
            };
            if documents.iter().any(|doc| doc.get(*field) == Some(value)) {
                return Err(StoreError::DuplicateKey(format!(
                    "{}.{field} {value}",
                    collection.name()
                )));
            }
        }

        documents.push(document);
        Ok(id)
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        mutations: &[Mutation],
    ) -> StoreResult<UpdateOutcome> {
        self.update(collection, filter, mutations, false).await
    }

    async fn update_many(
        &self,
        collection: Collection,
        filter: &Filter,
        mutations: &[Mutation],
    ) -> StoreResult<UpdateOutcome> {
        self.update(collection, filter, mutations, true).await
    }

    async fn aggregate(&self, collection: Collection, pipeline: &[Stage]) -> StoreResult<Vec<Value>> {
        let mut documents = {
            let collections = self.collections.read().await;
            collections.get(&collection).cloned().unwrap_or_default()
        };

        for stage in pipeline {
            documents = match stage {
                Stage::Match(filter) => documents
                    .into_iter()
                    .filter(|doc| matches(doc, filter))
                    .collect(),
                Stage::Unwind(path) => unwind(documents, path)?,
                Stage::GroupSum { key, sum, output } => group_sum(&documents, key, sum, output),
            };
        }

        Ok(documents)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Fields carrying a unique index in MongoDB.
const fn unique_fields(collection: Collection) -> &'static [&'static str] {
    match collection {
        Collection::Users => &["email"],
        Collection::Products => &[],
    }
}

// =============================================================================
// Path helpers
// =============================================================================

fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.get(segment))
}

fn lookup_mut<'a>(document: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.get_mut(segment))
}

fn not_an_object(path: &str) -> StoreError {
    StoreError::InvalidDocument(format!("cannot descend into non-object at '{path}'"))
}

/// Set a dotted path, creating intermediate objects.
fn assign(document: &mut Value, path: &str, value: Value) -> StoreResult<()> {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut current = document;
    if let Some(parents) = parents {
        for segment in parents.split('.') {
            let object = current.as_object_mut().ok_or_else(|| not_an_object(path))?;
            current = object
                .entry(segment)
                .or_insert_with(|| Value::Object(Map::new()));
        }
    }

    current
        .as_object_mut()
        .ok_or_else(|| not_an_object(path))?
        .insert(leaf.to_owned(), value);
    Ok(())
}

/// Get the array at `path`, creating an empty one when missing.
fn array_at<'a>(document: &'a mut Value, path: &str) -> StoreResult<&'a mut Vec<Value>> {
    if lookup(document, path).is_none() {
        assign(document, path, Value::Array(Vec::new()))?;
    }
    lookup_mut(document, path)
        .and_then(Value::as_array_mut)
        .ok_or_else(|| StoreError::InvalidDocument(format!("'{path}' is not an array")))
}

// =============================================================================
// Filters and mutations
// =============================================================================

/// Every value reachable through `path`, fanning out across arrays the way
/// MongoDB queries do (`orders.id` reaches the `id` of each order).
fn reachable<'a>(document: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![document];
    for segment in path.split('.') {
        current = current
            .into_iter()
            .flat_map(|value| match value {
                Value::Array(elements) => elements.iter().filter_map(|e| e.get(segment)).collect(),
                other => other.get(segment).into_iter().collect::<Vec<_>>(),
            })
            .collect();
    }
    current
}

fn matches(document: &Value, filter: &Filter) -> bool {
    filter.conditions().iter().all(|condition| match condition {
        Condition::Eq { path, value } => reachable(document, path).contains(&value),
        Condition::Exists { path, exists } => !reachable(document, path).is_empty() == *exists,
        Condition::Contains { path, needle } => {
            let needle = needle.to_lowercase();
            reachable(document, path)
                .into_iter()
                .filter_map(Value::as_str)
                .any(|text| text.to_lowercase().contains(&needle))
        }
    })
}

/// Apply one mutation, returning whether the document changed.
fn apply(document: &mut Value, mutation: &Mutation) -> StoreResult<bool> {
    match mutation {
        Mutation::Set { path, value } => {
            let changed = lookup(document, path) != Some(value);
            assign(document, path, value.clone())?;
            Ok(changed)
        }
        Mutation::Push { path, values } => {
            let array = array_at(document, path)?;
            array.extend(values.iter().cloned());
            Ok(!values.is_empty())
        }
        Mutation::Pull { path, key, value } => {
            let Some(target) = lookup_mut(document, path) else {
                return Ok(false);
            };
            let array = target
                .as_array_mut()
                .ok_or_else(|| StoreError::InvalidDocument(format!("'{path}' is not an array")))?;
            let before = array.len();
            array.retain(|element| element.get(key) != Some(value));
            Ok(array.len() != before)
        }
        Mutation::PushInto {
            path,
            key,
            value,
            target,
            values,
        } => {
            let array = array_at(document, path)?;
            let mut changed = false;
            for element in array
                .iter_mut()
                .filter(|element| element.get(key) == Some(value))
            {
                let items = array_at(element, target)?;
                items.extend(values.iter().cloned());
                changed |= !values.is_empty();
            }
            Ok(changed)
        }
    }
}

// =============================================================================
// Aggregation stages
// =============================================================================

fn unwind(documents: Vec<Value>, path: &str) -> StoreResult<Vec<Value>> {
    let mut unwound = Vec::new();
    for document in documents {
        match lookup(&document, path) {
            Some(Value::Array(elements)) => {
                for element in elements {
                    let mut copy = document.clone();
                    assign(&mut copy, path, element.clone())?;
                    unwound.push(copy);
                }
            }
            None | Some(Value::Null) => {}
            Some(_) => unwound.push(document),
        }
    }
    Ok(unwound)
}

/// Running `$sum` that stays integral until a non-integer shows up.
#[derive(Default)]
struct Total {
    integer: i64,
    float: f64,
    is_float: bool,
}

impl Total {
    fn add(&mut self, value: &Value) {
        if !self.is_float {
            if let Some(n) = value.as_i64() {
                if let Some(sum) = self.integer.checked_add(n) {
                    self.integer = sum;
                    return;
                }
            }
        }
        if let Some(n) = value.as_f64() {
            if !self.is_float {
                #[allow(clippy::cast_precision_loss)]
                let promoted = self.integer as f64;
                self.float = promoted;
                self.is_float = true;
            }
            self.float += n;
        }
    }

    fn into_value(self) -> Value {
        if self.is_float {
            Number::from_f64(self.float).map_or(Value::Null, Value::Number)
        } else {
            Value::from(self.integer)
        }
    }
}

fn group_sum(documents: &[Value], key: &str, sum: &str, output: &str) -> Vec<Value> {
    let mut groups: Vec<(Value, Total)> = Vec::new();
    for document in documents {
        let group_key = lookup(document, key).cloned().unwrap_or(Value::Null);
        let index = match groups.iter().position(|(existing, _)| *existing == group_key) {
            Some(index) => index,
            None => {
                groups.push((group_key, Total::default()));
                groups.len() - 1
            }
        };
        if let (Some(value), Some((_, total))) = (lookup(document, sum), groups.get_mut(index)) {
            total.add(value);
        }
    }

    groups
        .into_iter()
        .map(|(group_key, total)| {
            let mut result = Map::new();
            result.insert(ID_FIELD.to_owned(), group_key);
            result.insert(output.to_owned(), total.into_value());
            Value::Object(result)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_one(
                Collection::Users,
                json!({"_id": "u1", "cart": [
                    {"product_id": "p1", "price": 10},
                    {"product_id": "p2", "price": 20},
                    {"product_id": "p1", "price": 10}
                ], "orders": []}),
            )
            .await
            .unwrap();
        store
            .insert_one(Collection::Users, json!({"_id": "u2", "cart": []}))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_insert_duplicate_id_rejected() {
        let store = seeded().await;
        let err = store
            .insert_one(Collection::Users, json!({"_id": "u1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn test_insert_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store
            .insert_one(Collection::Users, json!({"_id": "u1", "email": "a@example.com"}))
            .await
            .unwrap();
        let err = store
            .insert_one(Collection::Users, json!({"_id": "u2", "email": "a@example.com"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn test_insert_without_id_rejected() {
        let store = MemoryStore::new();
        let err = store
            .insert_one(Collection::Products, json!({"name": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument(_)));
    }

    #[tokio::test]
    async fn test_pull_removes_every_match() {
        let store = seeded().await;
        let outcome = store
            .update_one(
                Collection::Users,
                &Filter::by_id("u1"),
                &[Mutation::pull("cart", "product_id", "p1")],
            )
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome { matched: 1, modified: 1 });

        let user = store.find_by_id(Collection::Users, "u1").await.unwrap().unwrap();
        assert_eq!(user["cart"], json!([{"product_id": "p2", "price": 20}]));
    }

    #[tokio::test]
    async fn test_pull_without_match_reports_unmodified() {
        let store = seeded().await;
        let outcome = store
            .update_one(
                Collection::Users,
                &Filter::by_id("u1"),
                &[Mutation::pull("cart", "product_id", "nope")],
            )
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome { matched: 1, modified: 0 });
    }

    #[tokio::test]
    async fn test_push_creates_missing_array() {
        let store = seeded().await;
        store
            .update_one(
                Collection::Users,
                &Filter::by_id("u2"),
                &[Mutation::push("orders", vec![json!({"id": "o1"})])],
            )
            .await
            .unwrap();
        let user = store.find_by_id(Collection::Users, "u2").await.unwrap().unwrap();
        assert_eq!(user["orders"], json!([{"id": "o1"}]));
    }

    #[tokio::test]
    async fn test_push_into_targets_matching_element_only() {
        let store = seeded().await;
        store
            .update_one(
                Collection::Users,
                &Filter::by_id("u1"),
                &[Mutation::push(
                    "orders",
                    vec![json!({"id": "o1", "items": []}), json!({"id": "o2", "items": []})],
                )],
            )
            .await
            .unwrap();
        store
            .update_one(
                Collection::Users,
                &Filter::by_id("u1"),
                &[Mutation::PushInto {
                    path: "orders".to_string(),
                    key: "id".to_string(),
                    value: json!("o2"),
                    target: "items".to_string(),
                    values: vec![json!({"product_id": "p9"})],
                }],
            )
            .await
            .unwrap();

        let user = store.find_by_id(Collection::Users, "u1").await.unwrap().unwrap();
        assert_eq!(user["orders"][0]["items"], json!([]));
        assert_eq!(user["orders"][1]["items"], json!([{"product_id": "p9"}]));
    }

    #[tokio::test]
    async fn test_conditional_set_respects_exists_filter() {
        let store = seeded().await;
        let claim = Filter::by_id("u2").exists("addresses.home", false);
        let first = store
            .update_one(
                Collection::Users,
                &claim,
                &[Mutation::set("addresses.home", json!({"house": "1"}))],
            )
            .await
            .unwrap();
        let second = store
            .update_one(
                Collection::Users,
                &claim,
                &[Mutation::set("addresses.home", json!({"house": "2"}))],
            )
            .await
            .unwrap();
        assert_eq!(first.matched, 1);
        assert_eq!(second.matched, 0);

        let user = store.find_by_id(Collection::Users, "u2").await.unwrap().unwrap();
        assert_eq!(user["addresses"]["home"]["house"], json!("1"));
    }

    #[tokio::test]
    async fn test_unwind_group_sums_one_user() {
        let store = seeded().await;
        let rows = store
            .aggregate(
                Collection::Users,
                &[
                    Stage::Match(Filter::by_id("u1")),
                    Stage::Unwind("cart".to_string()),
                    Stage::GroupSum {
                        key: ID_FIELD.to_string(),
                        sum: "cart.price".to_string(),
                        output: "total".to_string(),
                    },
                ],
            )
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({"_id": "u1", "total": 40})]);
    }

    #[tokio::test]
    async fn test_unwind_drops_empty_arrays() {
        let store = seeded().await;
        let rows = store
            .aggregate(
                Collection::Users,
                &[
                    Stage::Match(Filter::by_id("u2")),
                    Stage::Unwind("cart".to_string()),
                    Stage::GroupSum {
                        key: ID_FIELD.to_string(),
                        sum: "cart.price".to_string(),
                        output: "total".to_string(),
                    },
                ],
            )
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_contains_is_case_insensitive() {
        let store = MemoryStore::new();
        store
            .insert_one(Collection::Products, json!({"_id": "p1", "name": "Trail Runner"}))
            .await
            .unwrap();
        store
            .insert_one(Collection::Products, json!({"_id": "p2", "name": "Kettle"}))
            .await
            .unwrap();
        let found = store
            .find_many(Collection::Products, &Filter::all().contains("name", "RUN"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["_id"], json!("p1"));
    }

    #[test]
    fn test_eq_reaches_into_arrays() {
        let doc = json!({"_id": "u1", "orders": [{"id": "o1"}, {"id": "o2"}]});
        assert!(matches(&doc, &Filter::by_id("u1").eq("orders.id", "o2")));
        assert!(!matches(&doc, &Filter::by_id("u1").eq("orders.id", "o3")));
    }

    #[test]
    fn test_group_sum_ignores_non_numeric() {
        let docs = vec![json!({"k": 1, "v": 5}), json!({"k": 1, "v": "x"}), json!({"k": 1, "v": 2.5})];
        let rows = group_sum(&docs, "k", "v", "total");
        assert_eq!(rows, vec![json!({"_id": 1, "total": 7.5})]);
    }
}
