//! Cache types for product responses.

use std::sync::Arc;

use mambini_core::ProductId;

use super::types::Product;

/// Cache key for catalogue responses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
}
