//! Shared access to a single cart store.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::CartError;
use super::line::{CartLineInput, CartSnapshot, LineKey};
use super::storage::CartStorage;
use super::store::CartStore;
use crate::error::add_breadcrumb;

/// Cheaply cloneable handle to the session's cart.
///
/// Each call locks the store for the duration of one synchronous operation;
/// the lock is never held across an `.await`.
#[derive(Clone, Debug)]
pub struct CartHandle {
    inner: Arc<Mutex<CartStore>>,
}

impl CartHandle {
    /// Open the cart persisted in `storage`.
    #[must_use]
    pub fn open(storage: Arc<dyn CartStorage>) -> Self {
        Self::from_store(CartStore::open(storage))
    }

    #[must_use]
    pub fn from_store(store: CartStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CartStore> {
        // Store operations never panic mid-mutation, so a poisoned lock still
        // guards a consistent cart.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// See [`CartStore::add_to_cart`].
    ///
    /// # Errors
    ///
    /// Propagates the store's validation and storage errors.
    pub fn add_to_cart(&self, input: CartLineInput) -> Result<(), CartError> {
        let product_id = input.product_id.to_string();
        let quantity = input.quantity.to_string();
        self.lock().add_to_cart(input)?;
        add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[
                ("product_id", product_id.as_str()),
                ("quantity", quantity.as_str()),
            ]),
        );
        Ok(())
    }

    /// See [`CartStore::remove_from_cart`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the cart could not be persisted.
    pub fn remove_from_cart(&self, key: &LineKey) -> Result<(), CartError> {
        self.lock().remove_from_cart(key)?;
        let line = key.to_string();
        add_breadcrumb("cart", "Removed from cart", Some(&[("line", line.as_str())]));
        Ok(())
    }

    /// See [`CartStore::update_quantity`].
    ///
    /// # Errors
    ///
    /// Propagates the store's validation and storage errors.
    pub fn update_quantity(&self, key: &LineKey, delta: i64) -> Result<u32, CartError> {
        self.lock().update_quantity(key, delta)
    }

    /// See [`CartStore::clear_cart`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the empty cart could not be persisted.
    pub fn clear_cart(&self) -> Result<(), CartError> {
        self.lock().clear_cart()
    }

    /// Current lines and derived totals.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.lock().snapshot()
    }
}
