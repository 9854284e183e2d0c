//! Backend-neutral query language for the document store.
//!
//! Repositories describe reads and writes with these types; each
//! [`DocumentStore`](super::store::DocumentStore) backend interprets them.
//! Field paths are dotted (`addresses.home`, `cart.price`).

use serde_json::Value;

/// A named collection of documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Products,
}

impl Collection {
    /// Collection name in the database.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Users => "Users",
            Self::Products => "Products",
        }
    }
}

/// The identity field of every document.
pub const ID_FIELD: &str = "_id";

/// One predicate on a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value.
    Eq { path: String, value: Value },
    /// Field is present (`true`) or absent (`false`).
    Exists { path: String, exists: bool },
    /// String field contains the needle, ignoring case.
    Contains { path: String, needle: String },
}

/// A conjunction of conditions. The empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Match every document.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Match the document with this `_id`.
    #[must_use]
    pub fn by_id(id: impl ToString) -> Self {
        Self::all().eq(ID_FIELD, Value::String(id.to_string()))
    }

    #[must_use]
    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            path: path.into(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn exists(mut self, path: impl Into<String>, exists: bool) -> Self {
        self.conditions.push(Condition::Exists {
            path: path.into(),
            exists,
        });
        self
    }

    #[must_use]
    pub fn contains(mut self, path: impl Into<String>, needle: impl Into<String>) -> Self {
        self.conditions.push(Condition::Contains {
            path: path.into(),
            needle: needle.into(),
        });
        self
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

/// One change applied by an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Overwrite (or create) the field.
    Set { path: String, value: Value },
    /// Append values to the array field, creating it if missing.
    Push { path: String, values: Vec<Value> },
    /// Remove every element of the array field whose `key` equals `value`.
    Pull { path: String, key: String, value: Value },
    /// For the element of the array field whose `key` equals `value`,
    /// append `values` to that element's `target` array.
    PushInto {
        path: String,
        key: String,
        value: Value,
        target: String,
        values: Vec<Value>,
    },
}

impl Mutation {
    #[must_use]
    pub fn set(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Set {
            path: path.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn push(path: impl Into<String>, values: Vec<Value>) -> Self {
        Self::Push {
            path: path.into(),
            values,
        }
    }

    #[must_use]
    pub fn pull(path: impl Into<String>, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Pull {
            path: path.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An aggregation pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Keep documents matching the filter.
    Match(Filter),
    /// Emit one document per element of the array field. Documents whose
    /// array is missing or empty are dropped.
    Unwind(String),
    /// Group by `key` and sum the numeric field `sum` into `output`.
    /// Non-numeric values are ignored. Each result is `{"_id": key, output: sum}`.
    GroupSum {
        key: String,
        sum: String,
        output: String,
    },
}

/// Counts reported by an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Documents that matched the filter.
    pub matched: u64,
    /// Documents actually changed.
    pub modified: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_builder_keeps_order() {
        let filter = Filter::by_id("u1").exists("addresses.home", false);
        assert_eq!(
            filter.conditions(),
            &[
                Condition::Eq {
                    path: ID_FIELD.to_string(),
                    value: Value::String("u1".to_string()),
                },
                Condition::Exists {
                    path: "addresses.home".to_string(),
                    exists: false,
                },
            ]
        );
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::Users.name(), "Users");
        assert_eq!(Collection::Products.name(), "Products");
    }
}
