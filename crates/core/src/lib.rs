//! Mambini Core - Shared domain types.
//!
//! This crate provides the types shared by the Mambini components:
//! - `storefront` - Cart, checkout orchestration and the REST gateway client
//! - `cli` - Developer tooling for inspecting carts, products and orders
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere,
//! including WASM front ends.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
