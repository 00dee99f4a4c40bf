//! The cart aggregation engine.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, error, instrument};

use super::CartError;
use super::line::{CartLine, CartLineInput, CartSnapshot, LineKey, checked_total};
use super::storage::{CART_STORAGE_KEY, CartStorage, decode_lines, encode_lines};

/// Authoritative, persisted list of cart lines.
///
/// Every mutation computes the next line list, writes it to storage, and only
/// then replaces the in-memory list. A rejected or failed operation leaves the
/// cart exactly as it was.
pub struct CartStore {
    lines: Vec<CartLine>,
    storage: Arc<dyn CartStorage>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Open the store, reading any previously persisted cart.
    ///
    /// Missing, unreadable, or corrupt data yields an empty cart.
    #[must_use]
    pub fn open(storage: Arc<dyn CartStorage>) -> Self {
        let lines = match storage.read(CART_STORAGE_KEY) {
            Ok(Some(raw)) => decode_lines(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored cart, starting empty");
                Vec::new()
            }
        };
        debug!(lines = lines.len(), "Cart store opened");

        Self { lines, storage }
    }

    /// Add a product to the cart.
    ///
    /// An existing line with the same identity has its quantity increased;
    /// its name, image, price and color are left as they were. Otherwise the
    /// line is appended.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] if `input.quantity` is zero
    /// - [`CartError::InvalidPrice`] if the unit price is negative
    /// - [`CartError::StockExceeded`] if the resulting quantity exceeds the
    ///   advisory stock limit
    /// - [`CartError::TotalOverflow`] if the cart total would overflow
    /// - [`CartError::Storage`] if the cart could not be persisted
    #[instrument(skip(self, input), fields(product_id = %input.product_id, size = %input.size))]
    pub fn add_to_cart(&mut self, input: CartLineInput) -> Result<(), CartError> {
        if input.quantity == 0 {
            return Err(CartError::InvalidQuantity { requested: 0 });
        }
        if input.unit_price < Decimal::ZERO {
            return Err(CartError::InvalidPrice);
        }

        let key = input.key();
        let mut next = self.lines.clone();

        if let Some(existing) = next.iter_mut().find(|line| line.matches(&key)) {
            let merged = u64::from(existing.quantity) + u64::from(input.quantity);
            let limit = existing.stock_limit.or(input.stock_limit);
            check_stock(limit, merged)?;
            existing.quantity = to_quantity(merged)?;
            if existing.stock_limit.is_none() {
                existing.stock_limit = input.stock_limit;
            }
        } else {
            check_stock(input.stock_limit, u64::from(input.quantity))?;
            next.push(input.into_line());
        }

        self.commit(next)
    }

    /// Remove the line with the given identity. Absent lines are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the cart could not be persisted.
    #[instrument(skip(self), fields(key = %key))]
    pub fn remove_from_cart(&mut self, key: &LineKey) -> Result<(), CartError> {
        if !self.lines.iter().any(|line| line.matches(key)) {
            return Ok(());
        }

        let next = self
            .lines
            .iter()
            .filter(|line| !line.matches(key))
            .cloned()
            .collect();
        self.commit(next)
    }

    /// Change a line's quantity by `delta`, returning the new quantity.
    ///
    /// A decrement that would reach zero is rejected rather than removing the
    /// line; removal is always explicit.
    ///
    /// # Errors
    ///
    /// - [`CartError::LineNotFound`] if no line has this identity
    /// - [`CartError::InvalidQuantity`] if the new quantity would be `<= 0`
    /// - [`CartError::StockExceeded`] if the new quantity exceeds the stock limit
    /// - [`CartError::TotalOverflow`] if the cart total would overflow
    /// - [`CartError::Storage`] if the cart could not be persisted
    #[instrument(skip(self), fields(key = %key))]
    pub fn update_quantity(&mut self, key: &LineKey, delta: i64) -> Result<u32, CartError> {
        let mut next = self.lines.clone();
        let line = next
            .iter_mut()
            .find(|line| line.matches(key))
            .ok_or_else(|| CartError::LineNotFound(key.clone()))?;

        let requested = i64::from(line.quantity).saturating_add(delta);
        if requested <= 0 {
            return Err(CartError::InvalidQuantity { requested });
        }
        let requested_u64 = requested.unsigned_abs();
        check_stock(line.stock_limit, requested_u64)?;

        let quantity = to_quantity(requested_u64)?;
        line.quantity = quantity;
        self.commit(next)?;
        Ok(quantity)
    }

    /// Empty the cart.
    ///
    /// The in-memory cart is emptied even if persisting fails: this runs
    /// after an order exists, and keeping the lines would invite a duplicate
    /// order. The storage error is still returned.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the empty cart could not be persisted.
    #[instrument(skip(self))]
    pub fn clear_cart(&mut self) -> Result<(), CartError> {
        self.lines.clear();
        let result = encode_lines(&self.lines)
            .and_then(|raw| self.storage.write(CART_STORAGE_KEY, &raw));
        if let Err(e) = result {
            error!(error = %e, "Failed to persist cleared cart");
            return Err(e.into());
        }
        Ok(())
    }

    /// Current lines and derived totals.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::from_lines(&self.lines)
    }

    /// Current lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    fn commit(&mut self, next: Vec<CartLine>) -> Result<(), CartError> {
        if checked_total(&next).is_none() {
            return Err(CartError::TotalOverflow);
        }
        let raw = encode_lines(&next)?;
        self.storage.write(CART_STORAGE_KEY, &raw)?;
        self.lines = next;
        Ok(())
    }
}

fn check_stock(limit: Option<u32>, requested: u64) -> Result<(), CartError> {
    match limit {
        Some(limit) if requested > u64::from(limit) => {
            Err(CartError::StockExceeded { limit, requested })
        }
        _ => Ok(()),
    }
}

fn to_quantity(requested: u64) -> Result<u32, CartError> {
    u32::try_from(requested).map_err(|_| CartError::InvalidQuantity {
        requested: i64::try_from(requested).unwrap_or(i64::MAX),
    })
}
