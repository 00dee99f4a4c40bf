//! Core types for Mambini.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod shipping;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price, UnknownCurrency};
pub use shipping::{DEFAULT_COUNTRY, ShippingField, ShippingInfo};
pub use status::*;
