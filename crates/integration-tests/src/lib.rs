//! Shared fixtures for the storefront integration tests.
//!
//! Each test gets its own [`TestShop`]: a `wiremock` server standing in for
//! the shop API and a temporary directory holding the file-backed cart, so
//! persistence is exercised the same way the CLI uses it.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mambini-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use mambini_core::{CurrencyCode, ShippingInfo};
use mambini_storefront::AppState;
use mambini_storefront::cart::{CartHandle, FileStorage};
use mambini_storefront::config::{ApiConfig, StorefrontConfig};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

/// Mock shop API plus a storefront wired to it.
pub struct TestShop {
    pub server: MockServer,
    pub state: AppState,
    dir: TempDir,
}

impl TestShop {
    /// Start a mock server and build state with a file-backed cart.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or the client cannot be created.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let config = StorefrontConfig {
            api: ApiConfig::new(&server.uri()).expect("Mock server URI is a valid base URL"),
            storage_dir: dir.path().to_path_buf(),
            currency: CurrencyCode::EUR,
            sentry_dsn: None,
            sentry_environment: None,
        };
        let state = AppState::new(config).expect("Failed to build storefront state");

        Self { server, state, dir }
    }

    /// Open the persisted cart afresh, as a new process would.
    #[must_use]
    pub fn reopen_cart(&self) -> CartHandle {
        CartHandle::open(Arc::new(FileStorage::new(self.dir.path())))
    }

    /// Number of requests the mock API has received.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}

/// A complete Lisbon shipping address.
#[must_use]
pub fn lisbon() -> ShippingInfo {
    ShippingInfo {
        address: "Rua Augusta 10".to_string(),
        city: "Lisboa".to_string(),
        postal_code: "1100-053".to_string(),
        phone: Some("+351 912 345 678".to_string()),
        ..ShippingInfo::default()
    }
}

/// Product body as served by `GET /products/{id}`.
#[must_use]
pub fn product_json(id: &str, name: &str, price: f64, stock: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "Washed linen, relaxed fit.",
        "price": price,
        "stock": stock,
        "sizes": ["S", "M", "L"],
        "available_sizes": ["M", "L"],
        "gender": "unisex",
        "category": "jackets",
        "colors": ["black", "sand"],
        "available_colors": [],
        "images": [format!("https://cdn.mambini.pt/{id}/1.jpg")],
        "visible_images": null,
        "created_at": "2026-02-01T09:30:00Z"
    })
}

/// Order body echoing an order request, as served by `POST /orders/`.
#[must_use]
pub fn order_json(id: &str, request: &Value, total: f64) -> Value {
    let shipping = &request["shipping"];
    json!({
        "id": id,
        "user_id": "64f1c0ffee",
        "user_email": "ana@mambini.pt",
        "user_name": "Ana Silva",
        "items": request["items"],
        "total_amount": total,
        "status": "pending",
        "shipping_address": shipping["address"],
        "shipping_city": shipping["city"],
        "shipping_postal_code": shipping["postal_code"],
        "shipping_country": shipping["country"],
        "shipping_phone": shipping["phone"],
        "created_at": "2026-03-14T10:15:00.123456",
        "updated_at": "2026-03-14T10:15:00.123456",
        "notes": request["notes"],
        "payment_intent_id": request["payment_intent_id"],
        "payment_status": "succeeded"
    })
}

/// Responds to `POST /orders/` by recording the posted order.
pub struct EchoOrder {
    pub id: &'static str,
    pub total: f64,
}

impl Respond for EchoOrder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        ResponseTemplate::new(200).set_body_json(order_json(self.id, &body, self.total))
    }
}
