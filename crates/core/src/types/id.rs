//! Newtype IDs for type-safe document references.
//!
//! Every stored document is keyed by a UUID v4 rendered as a lowercase
//! hyphenated string (the `_id` field). Use the `define_id!` macro to create
//! wrappers that prevent accidentally mixing IDs from different collections.

use thiserror::Error;

/// Errors that can occur when parsing an identifier from untrusted input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty.
    #[error("identifier cannot be empty")]
    Empty,
    /// The input is not a valid UUID.
    #[error("malformed identifier: {0}")]
    Malformed(String),
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `uuid::Uuid` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]` (string form)
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `generate()` for fresh IDs and `parse()` for untrusted input
/// - `Display` and `FromStr`
///
/// # Example
///
/// ```rust
/// # use emporium_core::define_id;
/// define_id!(BasketId);
///
/// let id = BasketId::generate();
/// let parsed = BasketId::parse(&id.to_string()).unwrap();
/// assert_eq!(id, parsed);
/// assert!(BasketId::parse("not-a-uuid").is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Generate a fresh random ID.
            #[must_use]
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Parse an ID supplied by a client.
            ///
            /// # Errors
            ///
            /// Returns `IdError::Empty` for blank input and
            /// `IdError::Malformed` when the input is not a UUID.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::IdError> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err($crate::IdError::Empty);
                }
                ::uuid::Uuid::parse_str(trimmed)
                    .map(Self)
                    .map_err(|_| $crate::IdError::Malformed(trimmed.to_owned()))
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

// Document identifiers
define_id!(UserId);
define_id!(ProductId);
define_id!(OrderId);
define_id!(AddressId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(UserId::generate(), UserId::generate());
    }

    #[test]
    fn test_parse_roundtrip_display() {
        let id = ProductId::generate();
        assert_eq!(ProductId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let id = OrderId::generate();
        let padded = format!("  {id}\n");
        assert_eq!(OrderId::parse(&padded).unwrap(), id);
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(UserId::parse("   "), Err(IdError::Empty));
    }

    #[test]
    fn test_parse_malformed() {
        // A 24-char hex object id from another store is not accepted
        assert!(matches!(
            UserId::parse("64b7f0c2a1e4f3b2c1d0e9f8"),
            Err(IdError::Malformed(_))
        ));
    }

    #[test]
    fn test_serializes_as_string() {
        let id = AddressId::generate();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }
}
