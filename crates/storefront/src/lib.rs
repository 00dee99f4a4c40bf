//! Mambini storefront core.
//!
//! Cart persistence, the checkout flow and the REST client for the shop API,
//! shared by the storefront front-ends and the `mambini` CLI.
//!
//! # Modules
//!
//! - [`cart`] - line list, merge rules and durable persistence
//! - [`checkout`] - shipping, payment and order state machine
//! - [`api`] - typed client for products, orders and payments
//! - [`config`] - environment configuration
//! - [`telemetry`] - tracing subscriber and Sentry setup

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod state;
pub mod telemetry;

pub use error::{Result, StorefrontError};
pub use state::AppState;
