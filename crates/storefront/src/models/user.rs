//! User domain types.
//!
//! A user is one document holding the profile, credentials, cart, address
//! book and order history. Every commerce operation mutates a slice of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use emporium_core::{AddressBook, Email, LineItem, Order, UserId};

/// A stored user document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// Most recently issued access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Most recently issued refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Line items in insertion order. Duplicates are allowed.
    #[serde(default)]
    pub cart: Vec<LineItem>,
    #[serde(default)]
    pub addresses: AddressBook,
    /// Append-only order history.
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// Fields needed to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub password_hash: String,
}

impl User {
    /// Build a fresh user with an empty cart, address book and history.
    ///
    /// Tokens are attached once they have been issued for the new ID.
    #[must_use]
    pub fn create(new: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::generate(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            phone: new.phone,
            password_hash: new.password_hash,
            token: None,
            refresh_token: None,
            created_at: now,
            updated_at: now,
            cart: Vec::new(),
            addresses: AddressBook::default(),
            orders: Vec::new(),
        }
    }

    /// The fields safe to return to the account owner.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public view of a user. Never carries the password hash or tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> User {
        let mut user = User::create(NewUser {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            phone: "5550100".to_string(),
            password_hash: "$argon2id$stub".to_string(),
        });
        user.token = Some("access".to_string());
        user
    }

    #[test]
    fn test_new_user_starts_empty() {
        let user = sample();
        assert!(user.cart.is_empty());
        assert!(user.addresses.is_empty());
        assert!(user.orders.is_empty());
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_profile_hides_secrets() {
        let json = serde_json::to_value(sample().profile()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("token").is_none());
        assert_eq!(json["email"], "ada@example.com");
    }

    #[test]
    fn test_document_uses_mongo_id_field() {
        let user = sample();
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["_id"], serde_json::json!(user.id.to_string()));
        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let user = sample();
        let mut json = serde_json::to_value(&user).unwrap();
        let object = json.as_object_mut().unwrap();
        object.remove("cart");
        object.remove("addresses");
        object.remove("orders");
        let back: User = serde_json::from_value(json).unwrap();
        assert!(back.cart.is_empty());
        assert!(back.orders.is_empty());
    }
}
