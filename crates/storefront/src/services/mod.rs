//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - add/remove line items, cart totals
//! - `checkout` - turn carts (or single products) into orders
//! - `addresses` - the two-slot home/work address book
//! - `catalog` - product listing, search and creation
//! - `auth` - signup, login and access tokens
//!
//! Services borrow the document store for the duration of a request. Every
//! operation runs under an absolute deadline; nothing is retried.

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
mod error;
mod locks;

use std::future::Future;
use std::time::Duration;

pub use addresses::AddressService;
pub use auth::{AuthError, AuthService, TokenIssuer};
pub use cart::{CartService, CartSummary};
pub use catalog::{CatalogService, NewProduct};
pub use checkout::OrderService;
pub use error::CommerceError;
pub use locks::UserLocks;

/// Per-operation time limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    /// Cart mutations, totals, checkout and instant buy.
    pub cart: Duration,
    /// Catalog, address book and account operations.
    pub account: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            cart: Duration::from_secs(5),
            account: Duration::from_secs(100),
        }
    }
}

/// Run an operation under a deadline.
///
/// Expiry drops the operation and yields [`CommerceError::Timeout`]; writes
/// already acknowledged by the store stay in place.
///
/// # Errors
///
/// Returns the operation's own error, or `Timeout` if it ran too long.
pub async fn within<T, E, F>(limit: Duration, operation: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<CommerceError>,
{
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| E::from(CommerceError::Timeout(limit)))?
}
