//! Command implementations.
//!
//! Each command returns its rendered output; `main` writes it to stdout.

pub mod cart;
pub mod orders;
pub mod payments;
pub mod products;
