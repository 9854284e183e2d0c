//! MongoDB document store.
//!
//! Translates [`Filter`], [`Mutation`] and [`Stage`] values into BSON and
//! runs them through the official driver. Documents cross the boundary as
//! relaxed extended JSON.

use async_trait::async_trait;
use mongodb::bson::{Bson, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, UpdateOptions};
use mongodb::{Client, Collection as MongoCollection, Database, IndexModel};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use super::query::{Collection, Condition, Filter, ID_FIELD, Mutation, Stage, UpdateOutcome};
use super::store::{DocumentStore, StoreError, StoreResult};

/// MongoDB error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Document store backed by a MongoDB database.
#[derive(Clone)]
pub struct MongoStore {
    database: Database,
}

impl std::fmt::Debug for MongoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoStore")
            .field("database", &self.database.name())
            .finish()
    }
}

impl MongoStore {
    /// Connect to the server and select the database.
    ///
    /// The driver connects lazily; use [`DocumentStore::ping`] to verify
    /// the server is reachable.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the connection string is invalid.
    pub async fn connect(uri: &SecretString, database: &str) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri.expose_secret())
            .await
            .map_err(map_error)?;
        Ok(Self {
            database: client.database(database),
        })
    }

    /// Create the indexes the repositories rely on.
    ///
    /// Idempotent: existing indexes with the same definition are kept.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if index creation fails.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection(Collection::Users)
            .create_index(email_index)
            .await
            .map_err(map_error)?;

        let phone_index = IndexModel::builder().keys(doc! { "phone": 1 }).build();
        self.collection(Collection::Users)
            .create_index(phone_index)
            .await
            .map_err(map_error)?;

        let name_index = IndexModel::builder().keys(doc! { "name": 1 }).build();
        self.collection(Collection::Products)
            .create_index(name_index)
            .await
            .map_err(map_error)?;

        tracing::info!(database = %self.database.name(), "MongoDB indexes ensured");
        Ok(())
    }

    fn collection(&self, collection: Collection) -> MongoCollection<Document> {
        self.database.collection(collection.name())
    }

    async fn update(
        &self,
        collection: Collection,
        filter: &Filter,
        mutations: &[Mutation],
        many: bool,
    ) -> StoreResult<UpdateOutcome> {
        let query = filter_document(filter)?;
        let (update, array_filters) = update_document(mutations)?;
        if update.is_empty() {
            return Ok(UpdateOutcome::default());
        }

        let mut options = UpdateOptions::default();
        if !array_filters.is_empty() {
            options.array_filters = Some(array_filters);
        }

        let target = self.collection(collection);
        let result = if many {
            target
                .update_many(query, update)
                .with_options(options)
                .await
        } else {
            target
                .update_one(query, update)
                .with_options(options)
                .await
        }
        .map_err(map_error)?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Value>> {
        let found = self
            .collection(collection)
            .find_one(doc! { ID_FIELD: id })
            .await
            .map_err(map_error)?;
        Ok(found.map(to_json))
    }

    async fn find_many(&self, collection: Collection, filter: &Filter) -> StoreResult<Vec<Value>> {
        let mut cursor = self
            .collection(collection)
            .find(filter_document(filter)?)
            .await
            .map_err(map_error)?;

        let mut documents = Vec::new();
        while cursor.advance().await.map_err(map_error)? {
            let document = cursor
                .deserialize_current()
                .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
            documents.push(to_json(document));
        }
        Ok(documents)
    }

    async fn insert_one(&self, collection: Collection, document: Value) -> StoreResult<String> {
        let id = document
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| StoreError::InvalidDocument("document has no string _id".to_owned()))?;

        let bson = mongodb::bson::to_document(&document)
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
        self.collection(collection)
            .insert_one(bson)
            .await
            .map_err(map_error)?;
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
        let stages = pipeline
            .iter()
            .map(stage_document)
            .collect::<StoreResult<Vec<_>>>()?;

        let mut cursor = self
            .collection(collection)
            .aggregate(stages)
            .await
            .map_err(map_error)?;

        let mut documents = Vec::new();
        while cursor.advance().await.map_err(map_error)? {
            let document = cursor
                .deserialize_current()
                .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
            documents.push(to_json(document));
        }
        Ok(documents)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(map_error)?;
        Ok(())
    }
}

fn map_error(error: mongodb::error::Error) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(ref write_error)) = *error.kind {
        if write_error.code == DUPLICATE_KEY_CODE {
            return StoreError::DuplicateKey(write_error.message.clone());
        }
    }
    StoreError::Unavailable(error.to_string())
}

fn to_json(document: Document) -> Value {
    Bson::Document(document).into_relaxed_extjson()
}

fn to_bson(value: &Value) -> StoreResult<Bson> {
    mongodb::bson::to_bson(value).map_err(|e| StoreError::InvalidDocument(e.to_string()))
}

fn to_bson_array(values: &[Value]) -> StoreResult<Bson> {
    values
        .iter()
        .map(to_bson)
        .collect::<StoreResult<Vec<_>>>()
        .map(Bson::Array)
}

fn condition_document(condition: &Condition) -> StoreResult<Document> {
    Ok(match condition {
        Condition::Eq { path, value } => doc! { path.as_str(): to_bson(value)? },
        Condition::Exists { path, exists } => doc! { path.as_str(): { "$exists": *exists } },
        Condition::Contains { path, needle } => doc! {
            path.as_str(): { "$regex": regex::escape(needle), "$options": "i" }
        },
    })
}

/// Conditions are combined with `$and` so repeated paths don't overwrite
/// each other.
fn filter_document(filter: &Filter) -> StoreResult<Document> {
    let mut conditions = filter
        .conditions()
        .iter()
        .map(condition_document)
        .collect::<StoreResult<Vec<_>>>()?;

    Ok(match conditions.len() {
        0 => Document::new(),
        1 => conditions.remove(0),
        _ => doc! { "$and": conditions },
    })
}

/// Build the update document and the array filters it references.
fn update_document(mutations: &[Mutation]) -> StoreResult<(Document, Vec<Document>)> {
    let mut set = Document::new();
    let mut push = Document::new();
    let mut pull = Document::new();
    let mut array_filters = Vec::new();

    for mutation in mutations {
        match mutation {
            Mutation::Set { path, value } => {
                set.insert(path.as_str(), to_bson(value)?);
            }
            Mutation::Push { path, values } => {
                push.insert(path.as_str(), doc! { "$each": to_bson_array(values)? });
            }
            Mutation::Pull { path, key, value } => {
                pull.insert(path.as_str(), doc! { key.as_str(): to_bson(value)? });
            }
            Mutation::PushInto {
                path,
                key,
                value,
                target,
                values,
            } => {
                let identifier = format!("elem{}", array_filters.len());
                push.insert(
                    format!("{path}.$[{identifier}].{target}"),
                    doc! { "$each": to_bson_array(values)? },
                );
                array_filters.push(doc! { format!("{identifier}.{key}"): to_bson(value)? });
            }
        }
    }

    let mut update = Document::new();
    for (operator, fields) in [("$set", set), ("$push", push), ("$pull", pull)] {
        if !fields.is_empty() {
            update.insert(operator, fields);
        }
    }
    Ok((update, array_filters))
}

fn stage_document(stage: &Stage) -> StoreResult<Document> {
    Ok(match stage {
        Stage::Match(filter) => doc! { "$match": filter_document(filter)? },
        Stage::Unwind(path) => doc! { "$unwind": { "path": format!("${path}") } },
        Stage::GroupSum { key, sum, output } => doc! {
            "$group": {
                "_id": format!("${key}"),
                output.as_str(): { "$sum": format!("${sum}") },
            }
        },
    })
}
