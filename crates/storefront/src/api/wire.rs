//! JSON bodies exchanged with the shop API.
//!
//! Response types are deliberately permissive (optional fields, raw strings
//! for enums and timestamps); [`super::conversions`] decides what is
//! required.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Payments
// =============================================================================

/// `POST /payment/create-intent` body.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntentRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

/// `POST /payment/create-intent` response.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentResponse {
    pub client_secret: Option<String>,
    pub payment_intent_id: Option<String>,
}

/// `GET /payment/intent/{id}` response. `amount` is in major units.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentStatusResponse {
    pub id: Option<String>,
    pub status: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
}

// =============================================================================
// Orders
// =============================================================================

/// One purchased line, both in requests and responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemDto {
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Shipping block of an order request.
#[derive(Debug, Clone, Serialize)]
pub struct ShippingDto {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// `POST /orders/` body.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCreateRequest {
    pub items: Vec<OrderItemDto>,
    pub shipping: ShippingDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
}

/// `PUT /orders/{id}/status` body.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusUpdateRequest {
    pub status: String,
}

/// Order as returned by every order endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderDto {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemDto>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,
    pub status: Option<String>,
    pub shipping_address: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_postal_code: Option<String>,
    pub shipping_country: Option<String>,
    pub shipping_phone: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub notes: Option<String>,
    pub payment_intent_id: Option<String>,
    pub payment_status: Option<String>,
}

// =============================================================================
// Products
// =============================================================================

/// Product as returned by `GET /products/` and `GET /products/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductDto {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub available_sizes: Vec<String>,
    pub gender: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub available_colors: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub visible_images: Option<Vec<String>>,
    pub created_at: Option<String>,
}
