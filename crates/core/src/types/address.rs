//! Delivery addresses and the two-slot address book.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::AddressId;

/// The role an address plays for its owner.
///
/// A user holds at most one address per role, which caps the address book
/// at two entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressRole {
    Home,
    Work,
}

impl AddressRole {
    /// Every role, in the order vacant roles are filled.
    pub const ALL: [Self; 2] = [Self::Home, Self::Work];

    /// Field name of this role inside the stored address book.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Work => "work",
        }
    }
}

impl fmt::Display for AddressRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing an [`AddressRole`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown address role '{0}', expected 'home' or 'work'")]
pub struct AddressRoleError(pub String);

impl FromStr for AddressRole {
    type Err = AddressRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Self::Home),
            "work" => Ok(Self::Work),
            other => Err(AddressRoleError(other.to_owned())),
        }
    }
}

/// The editable part of an address, as submitted by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFields {
    pub house: String,
    pub street: String,
    pub city: String,
    pub postcode: String,
}

/// A stored address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub house: String,
    pub street: String,
    pub city: String,
    pub postcode: String,
}

impl Address {
    /// Create an address with a fresh ID.
    #[must_use]
    pub fn new(fields: AddressFields) -> Self {
        Self::with_id(AddressId::generate(), fields)
    }

    /// Create an address that keeps an existing ID (used when overwriting).
    #[must_use]
    pub fn with_id(id: AddressId, fields: AddressFields) -> Self {
        Self {
            id,
            house: fields.house,
            street: fields.street,
            city: fields.city,
            postcode: fields.postcode,
        }
    }
}

/// A user's addresses keyed by role.
///
/// Stored as `{"home": {...}, "work": {...}}` with vacant roles omitted, so
/// a role can be claimed atomically with an "exists: false" filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work: Option<Address>,
}

impl AddressBook {
    /// Maximum number of addresses a user may hold.
    pub const CAPACITY: usize = AddressRole::ALL.len();

    /// The address in a role, if any.
    #[must_use]
    pub const fn get(&self, role: AddressRole) -> Option<&Address> {
        match role {
            AddressRole::Home => self.home.as_ref(),
            AddressRole::Work => self.work.as_ref(),
        }
    }

    /// Number of stored addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        AddressRole::ALL
            .iter()
            .filter(|role| self.get(**role).is_some())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The first role without an address, home before work.
    #[must_use]
    pub fn vacant_role(&self) -> Option<AddressRole> {
        AddressRole::ALL
            .into_iter()
            .find(|role| self.get(*role).is_none())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fields(house: &str) -> AddressFields {
        AddressFields {
            house: house.to_string(),
            street: "Harbour Road".to_string(),
            city: "Leith".to_string(),
            postcode: "EH6 6LX".to_string(),
        }
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("home".parse::<AddressRole>().unwrap(), AddressRole::Home);
        assert_eq!(" WORK ".parse::<AddressRole>().unwrap(), AddressRole::Work);
        assert!("office".parse::<AddressRole>().is_err());
    }

    #[test]
    fn test_vacant_role_order() {
        let mut book = AddressBook::default();
        assert_eq!(book.vacant_role(), Some(AddressRole::Home));
        book.home = Some(Address::new(fields("1")));
        assert_eq!(book.vacant_role(), Some(AddressRole::Work));
        book.work = Some(Address::new(fields("2")));
        assert_eq!(book.vacant_role(), None);
        assert_eq!(book.len(), AddressBook::CAPACITY);
    }

    #[test]
    fn test_work_only_leaves_home_vacant() {
        let book = AddressBook {
            home: None,
            work: Some(Address::new(fields("9"))),
        };
        assert_eq!(book.len(), 1);
        assert_eq!(book.vacant_role(), Some(AddressRole::Home));
    }

    #[test]
    fn test_empty_book_serializes_to_empty_object() {
        let json = serde_json::to_value(AddressBook::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_with_id_keeps_id() {
        let original = Address::new(fields("1"));
        let edited = Address::with_id(original.id, fields("2"));
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.house, "2");
    }
}
