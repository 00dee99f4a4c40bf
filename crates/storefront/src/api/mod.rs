//! REST client for the shop API.
//!
//! # Architecture
//!
//! - Plain JSON over HTTPS with `reqwest`; bearer token when one is held
//! - Wire DTOs live in [`wire`] and are converted into domain types at a
//!   single boundary ([`conversions`]) that fails closed
//! - Product responses are cached in memory via `moka`
//! - Checkout talks to the API only through the [`Gateway`] trait
//!
//! # Example
//!
//! ```rust,ignore
//! use mambini_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let product = client.get_product(&"p1".into()).await?;
//! let orders = client.list_my_orders().await?;
//! ```

mod cache;
mod client;
mod conversions;
mod gateway;
mod orders;
mod payments;
mod products;
pub mod types;
pub mod wire;

pub use client::ApiClient;
pub use gateway::{Gateway, InMemoryGateway};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the shop API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    /// Missing or rejected bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response parsed but is missing required data.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A resource id that cannot be used as a path segment.
    #[error("Invalid resource id: {0:?}")]
    InvalidId(String),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Whether retrying the same request later may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Flatten an error body's `detail` into a single line.
///
/// The API reports errors as `{"detail": "..."}`, or as a list of validation
/// entries `{"detail": [{"loc": [..], "msg": ".."}]}`. Anything else is
/// returned truncated as-is.
#[must_use]
pub fn format_api_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return truncate(body, 200);
    };

    match value.get("detail") {
        Some(serde_json::Value::String(detail)) => detail.clone(),
        Some(serde_json::Value::Array(entries)) => {
            if entries.is_empty() {
                return "(no error details provided)".to_string();
            }
            entries
                .iter()
                .map(format_detail_entry)
                .collect::<Vec<_>>()
                .join("; ")
        }
        Some(other) => other.to_string(),
        None => truncate(body, 200),
    }
}

fn format_detail_entry(entry: &serde_json::Value) -> String {
    let msg = entry.get("msg").and_then(serde_json::Value::as_str);
    let loc = entry
        .get("loc")
        .and_then(serde_json::Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .map(|p| match p {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".")
        })
        .filter(|loc| !loc.is_empty());

    match (msg, loc) {
        (Some(msg), Some(loc)) => format!("{msg} (at {loc})"),
        (Some(msg), None) => msg.to_string(),
        (None, Some(loc)) => format!("invalid value at {loc}"),
        (None, None) => entry.to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
