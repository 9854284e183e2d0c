//! Address book guard.
//!
//! A user holds at most one home and one work address. Adds claim the first
//! vacant role with a conditional update, so concurrent adds can never push
//! the book past two entries.

use std::time::Duration;

use tracing::instrument;

use emporium_core::{Address, AddressBook, AddressFields, AddressRole, UserId};

use super::{CommerceError, within};
use crate::db::{DocumentStore, UserRepository};

/// Maximum length of any single address field.
const MAX_FIELD_LENGTH: usize = 200;

/// Address book service.
pub struct AddressService<'a> {
    users: UserRepository<'a>,
    deadline: Duration,
}

impl<'a> AddressService<'a> {
    /// Create a new address service.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, deadline: Duration) -> Self {
        Self {
            users: UserRepository::new(store),
            deadline,
        }
    }

    /// Store a new address in the first vacant role, home before work.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::AddressLimitExceeded` if both roles are taken.
    /// Returns `CommerceError::InvalidInput` if a field is blank or too long.
    /// Returns `CommerceError::UserNotFound` if the user doesn't exist.
    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn add(
        &self,
        user_id: UserId,
        input: AddressFields,
    ) -> Result<(AddressRole, Address), CommerceError> {
        let fields = validate(input)?;
        within(self.deadline, async {
            let user = self.users.get(user_id).await?.ok_or(CommerceError::UserNotFound)?;
            if user.addresses.vacant_role().is_none() {
                tracing::warn!("Address rejected: limit reached");
                return Err(CommerceError::AddressLimitExceeded);
            }

            let address = Address::new(fields);
            for role in AddressRole::ALL {
                if user.addresses.get(role).is_some() {
                    continue;
                }
                if self.users.claim_address(user_id, role, &address).await? {
                    tracing::info!(%role, address_id = %address.id, "Address added");
                    return Ok((role, address));
                }
            }

            // Every vacant role was claimed between the read and the write.
            tracing::warn!("Address rejected: limit reached concurrently");
            Err(CommerceError::AddressLimitExceeded)
        })
        .await
    }

    /// Overwrite the address in a role, keeping its ID.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::AddressNotFound` if the role is vacant.
    /// Returns `CommerceError::UserNotFound` if the user doesn't exist.
    #[instrument(skip(self, input), fields(user_id = %user_id, role = %role))]
    pub async fn edit(
        &self,
        user_id: UserId,
        role: AddressRole,
        input: AddressFields,
    ) -> Result<Address, CommerceError> {
        let fields = validate(input)?;
        within(self.deadline, async {
            let user = self.users.get(user_id).await?.ok_or(CommerceError::UserNotFound)?;
            let existing = user
                .addresses
                .get(role)
                .ok_or(CommerceError::AddressNotFound(role))?;

            let address = Address::with_id(existing.id, fields);
            if !self.users.replace_address(user_id, role, &address).await? {
                return Err(CommerceError::AddressNotFound(role));
            }

            tracing::info!(address_id = %address.id, "Address updated");
            Ok(address)
        })
        .await
    }

    /// Remove every address.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::UserNotFound` if the user doesn't exist.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn delete_all(&self, user_id: UserId) -> Result<(), CommerceError> {
        within(self.deadline, async {
            self.users.clear_addresses(user_id).await?;
            tracing::info!("Addresses deleted");
            Ok(())
        })
        .await
    }

    /// The user's address book.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::UserNotFound` if the user doesn't exist.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list(&self, user_id: UserId) -> Result<AddressBook, CommerceError> {
        within(self.deadline, async {
            let user = self.users.get(user_id).await?.ok_or(CommerceError::UserNotFound)?;
            Ok(user.addresses)
        })
        .await
    }
}

/// Trim every field and reject blank or oversized ones.
fn validate(fields: AddressFields) -> Result<AddressFields, CommerceError> {
    let check = |name: &str, value: String| -> Result<String, CommerceError> {
        let value = value.trim().to_owned();
        if value.is_empty() {
            return Err(CommerceError::InvalidInput(format!("{name} is required")));
        }
        if value.chars().count() > MAX_FIELD_LENGTH {
            return Err(CommerceError::InvalidInput(format!(
                "{name} must be at most {MAX_FIELD_LENGTH} characters"
            )));
        }
        Ok(value)
    };

    Ok(AddressFields {
        house: check("house", fields.house)?,
        street: check("street", fields.street)?,
        city: check("city", fields.city)?,
        postcode: check("postcode", fields.postcode)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::test_support::insert_user;

    const DEADLINE: Duration = Duration::from_secs(5);

    fn fields(house: &str) -> AddressFields {
        AddressFields {
            house: house.to_string(),
            street: "Canal Street".to_string(),
            city: "Manchester".to_string(),
            postcode: "M1 3HE".to_string(),
        }
    }

    #[tokio::test]
    async fn test_third_address_rejected() {
        let store = MemoryStore::new();
        let user = insert_user(&store, "ada@example.com").await;
        let service = AddressService::new(&store, DEADLINE);

        let (first, _) = service.add(user.id, fields("1")).await.unwrap();
        let (second, _) = service.add(user.id, fields("2")).await.unwrap();
        assert_eq!(first, AddressRole::Home);
        assert_eq!(second, AddressRole::Work);

        assert!(matches!(
            service.add(user.id, fields("3")).await,
            Err(CommerceError::AddressLimitExceeded)
        ));
        let book = service.list(user.id).await.unwrap();
        assert_eq!(book.len(), 2);
        assert_eq!(book.home.unwrap().house, "1");
        assert_eq!(book.work.unwrap().house, "2");
    }

    #[tokio::test]
    async fn test_concurrent_adds_never_exceed_two() {
        let store = MemoryStore::new();
        let user = insert_user(&store, "ada@example.com").await;
        let service = AddressService::new(&store, DEADLINE);

        let (a, b, c) = tokio::join!(
            service.add(user.id, fields("1")),
            service.add(user.id, fields("2")),
            service.add(user.id, fields("3")),
        );
        let added = [a.is_ok(), b.is_ok(), c.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(added, 2);
        assert_eq!(service.list(user.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_edit_home_leaves_work() {
        let store = MemoryStore::new();
        let user = insert_user(&store, "ada@example.com").await;
        let service = AddressService::new(&store, DEADLINE);

        let (_, home) = service.add(user.id, fields("1")).await.unwrap();
        let (_, work) = service.add(user.id, fields("2")).await.unwrap();

        let replacement = AddressFields {
            house: "X".to_string(),
            street: "Y".to_string(),
            city: "Z".to_string(),
            postcode: "W".to_string(),
        };
        let edited = service
            .edit(user.id, AddressRole::Home, replacement.clone())
            .await
            .unwrap();
        assert_eq!(edited, Address::with_id(home.id, replacement));

        let book = service.list(user.id).await.unwrap();
        assert_eq!(book.home, Some(edited));
        assert_eq!(book.work, Some(work));
    }

    #[tokio::test]
    async fn test_edit_vacant_role_is_not_found() {
        let store = MemoryStore::new();
        let user = insert_user(&store, "ada@example.com").await;
        let service = AddressService::new(&store, DEADLINE);
        service.add(user.id, fields("1")).await.unwrap();

        assert!(matches!(
            service.edit(user.id, AddressRole::Work, fields("9")).await,
            Err(CommerceError::AddressNotFound(AddressRole::Work))
        ));
    }

    #[tokio::test]
    async fn test_delete_all_frees_both_roles() {
        let store = MemoryStore::new();
        let user = insert_user(&store, "ada@example.com").await;
        let service = AddressService::new(&store, DEADLINE);
        service.add(user.id, fields("1")).await.unwrap();
        service.add(user.id, fields("2")).await.unwrap();

        service.delete_all(user.id).await.unwrap();
        assert!(service.list(user.id).await.unwrap().is_empty());

        let (role, _) = service.add(user.id, fields("3")).await.unwrap();
        assert_eq!(role, AddressRole::Home);
    }

    #[tokio::test]
    async fn test_blank_field_rejected() {
        let store = MemoryStore::new();
        let user = insert_user(&store, "ada@example.com").await;
        let service = AddressService::new(&store, DEADLINE);
        let mut blank = fields("1");
        blank.city = "   ".to_string();

        assert!(matches!(
            service.add(user.id, blank).await,
            Err(CommerceError::InvalidInput(_))
        ));
        assert!(service.list(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let store = MemoryStore::new();
        let service = AddressService::new(&store, DEADLINE);
        assert!(matches!(
            service.add(UserId::generate(), fields("1")).await,
            Err(CommerceError::UserNotFound)
        ));
        assert!(matches!(
            service.delete_all(UserId::generate()).await,
            Err(CommerceError::UserNotFound)
        ));
    }
}
