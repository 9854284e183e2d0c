//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::DocumentStore;
use crate::services::{
    AddressService, AuthService, CartService, CatalogService, OrderService, TokenIssuer, UserLocks,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the document store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn DocumentStore>,
    tokens: TokenIssuer,
    locks: UserLocks,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `store` - Document store backing users and products
    #[must_use]
    pub fn new(config: StorefrontConfig, store: Arc<dyn DocumentStore>) -> Self {
        let tokens = TokenIssuer::new(
            &config.token_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        );
        let locks = UserLocks::for_deadline(config.deadlines.cart);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                tokens,
                locks,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the token issuer.
    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.inner.tokens
    }

    #[must_use]
    pub fn cart(&self) -> CartService<'_> {
        CartService::new(
            self.store(),
            &self.inner.locks,
            self.inner.config.deadlines.cart,
        )
    }

    #[must_use]
    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(
            self.store(),
            &self.inner.locks,
            self.inner.config.deadlines.cart,
        )
    }

    #[must_use]
    pub fn addresses(&self) -> AddressService<'_> {
        AddressService::new(self.store(), self.inner.config.deadlines.account)
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.store(), self.inner.config.deadlines.account)
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(
            self.store(),
            &self.inner.tokens,
            self.inner.config.deadlines.account,
        )
    }
}
