//! Shared storefront state: configuration, API client and the cart.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::cart::{CartHandle, CartStorage, FileStorage};
use crate::checkout::Checkout;
use crate::config::StorefrontConfig;

/// State shared by every view of the storefront.
///
/// Cheaply cloneable via `Arc`; clones share one cart and one API client.
#[derive(Clone, Debug)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    cart: CartHandle,
}

impl AppState {
    /// Build state with the cart persisted under `config.storage_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let storage: Arc<dyn CartStorage> = Arc::new(FileStorage::new(config.storage_dir.clone()));
        Self::with_storage(config, storage)
    }

    /// Build state over an explicit cart storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(
        config: StorefrontConfig,
        storage: Arc<dyn CartStorage>,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api)?;
        let cart = CartHandle::open(storage);

        Ok(Self {
            inner: Arc::new(AppStateInner { config, api, cart }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the REST API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn cart(&self) -> &CartHandle {
        &self.inner.cart
    }

    /// Start a checkout over this state's cart.
    #[must_use]
    pub fn checkout(&self) -> Checkout<ApiClient> {
        Checkout::new(
            self.inner.api.clone(),
            self.inner.cart.clone(),
            self.inner.config.currency,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::cart::{CartLineInput, MemoryStorage};
    use crate::checkout::CheckoutStep;
    use crate::config::ApiConfig;

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            api: ApiConfig::new("http://localhost:8000").unwrap(),
            storage_dir: ".mambini".into(),
            currency: mambini_core::CurrencyCode::EUR,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_clones_share_cart() {
        let state = AppState::with_storage(config(), Arc::new(MemoryStorage::new())).unwrap();
        let other = state.clone();
        state
            .cart()
            .add_to_cart(CartLineInput::new("p1", "Jacket", Decimal::TEN, "M", 1))
            .unwrap();
        assert_eq!(other.cart().snapshot().count, 1);
    }

    #[test]
    fn test_checkout_starts_in_shipping() {
        let state = AppState::with_storage(config(), Arc::new(MemoryStorage::new())).unwrap();
        assert_eq!(state.checkout().state().step, CheckoutStep::Shipping);
    }
}
