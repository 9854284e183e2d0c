//! Commerce error types.

use std::time::Duration;

use thiserror::Error;

use emporium_core::{AddressRole, IdError};

use crate::db::{RepositoryError, StoreError};

/// Errors that can occur during cart, order, address and catalog operations.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// An identifier did not parse.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdError),

    #[error("user not found")]
    UserNotFound,

    #[error("product not found")]
    ProductNotFound,

    /// No address is stored in the role.
    #[error("no {0} address on file")]
    AddressNotFound(AddressRole),

    /// Both address roles are taken.
    #[error("address limit reached: at most two addresses per user")]
    AddressLimitExceeded,

    /// A request field failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation did not finish within its deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The document store failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored document could not be decoded.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Repositories only report `NotFound` for updates addressed to a user
/// document, so it maps to [`CommerceError::UserNotFound`].
impl From<RepositoryError> for CommerceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => Self::UserNotFound,
            RepositoryError::DataCorruption(detail)
            | RepositoryError::Store(StoreError::InvalidDocument(detail)) => {
                Self::DataCorruption(detail)
            }
            RepositoryError::Conflict(detail) => Self::InvalidInput(detail),
            RepositoryError::Store(other) => Self::StoreUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_mapping() {
        assert!(matches!(
            CommerceError::from(RepositoryError::NotFound),
            CommerceError::UserNotFound
        ));
        assert!(matches!(
            CommerceError::from(RepositoryError::Store(StoreError::Unavailable("down".into()))),
            CommerceError::StoreUnavailable(_)
        ));
        assert!(matches!(
            CommerceError::from(RepositoryError::Store(StoreError::InvalidDocument("bad".into()))),
            CommerceError::DataCorruption(_)
        ));
    }

    #[test]
    fn test_address_not_found_names_role() {
        let error = CommerceError::AddressNotFound(AddressRole::Work);
        assert_eq!(error.to_string(), "no work address on file");
    }
}
