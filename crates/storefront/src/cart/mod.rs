//! Shopping cart.
//!
//! # Architecture
//!
//! - [`CartStore`] owns the ordered line list and is the only writer of the
//!   persisted cart slot
//! - [`CartStorage`] abstracts the durable key-value slot (file, memory,
//!   browser storage behind a WASM binding)
//! - [`CartHandle`] shares one store between the views and the checkout
//!
//! Lines are merged by [`LineKey`] (product, size, color). Quantities are
//! always at least one; derived totals are recomputed on every snapshot.

mod handle;
mod line;
mod storage;
mod store;

pub use handle::CartHandle;
pub use line::{CartLine, CartLineInput, CartSnapshot, LineKey};
pub use storage::{
    CART_SCHEMA_VERSION, CART_STORAGE_KEY, CartStorage, FileStorage, MemoryStorage, StorageError,
    decode_lines, encode_lines,
};
pub use store::CartStore;

use thiserror::Error;

/// Errors returned by cart operations.
///
/// A failed operation never changes the cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// The resulting quantity would be below one.
    #[error("quantity must be at least 1 (requested {requested})")]
    InvalidQuantity { requested: i64 },

    /// The resulting quantity exceeds the advisory stock limit.
    #[error("only {limit} in stock (requested {requested})")]
    StockExceeded { limit: u32, requested: u64 },

    /// Unit price is negative.
    #[error("unit price cannot be negative")]
    InvalidPrice,

    /// The cart total would exceed the representable amount.
    #[error("cart total is too large")]
    TotalOverflow,

    /// No line with this identity.
    #[error("cart line not found: {0}")]
    LineNotFound(LineKey),

    /// The cart could not be persisted.
    #[error("cart storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CartError {
    /// Whether the error comes from input validation rather than storage.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}
