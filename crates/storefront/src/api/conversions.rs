//! Conversion from wire DTOs into domain types.
//!
//! Every response passes through here. Missing required fields, negative
//! amounts, unknown statuses and malformed emails are rejected with
//! [`ApiError::InvalidResponse`] rather than defaulted.

use chrono::{DateTime, NaiveDateTime, Utc};
use mambini_core::{
    CurrencyCode, Email, OrderId, OrderStatus, PaymentIntentId, PaymentIntentStatus, Price,
    ProductId, ShippingInfo, UserId,
};
use rust_decimal::Decimal;
use secrecy::SecretString;

use super::ApiError;
use super::types::{
    Gender, NewOrder, Order, OrderItem, PaymentIntent, PaymentIntentState, Product,
};
use super::wire::{
    OrderCreateRequest, OrderDto, OrderItemDto, PaymentIntentResponse,
    PaymentIntentStatusResponse, ProductDto, ShippingDto,
};

fn invalid(what: impl Into<String>) -> ApiError {
    ApiError::InvalidResponse(what.into())
}

/// Required, non-blank string field.
fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| invalid(format!("missing {field}")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn non_negative(value: Option<Decimal>, field: &str) -> Result<Decimal, ApiError> {
    match value {
        Some(v) if v.is_sign_negative() && !v.is_zero() => {
            Err(invalid(format!("negative {field}: {v}")))
        }
        Some(v) => Ok(v),
        None => Err(invalid(format!("missing {field}"))),
    }
}

/// Parse an API timestamp.
///
/// Accepts RFC 3339 as well as naive `YYYY-MM-DD HH:MM:SS[.ffffff]` (space or
/// `T` separated), which is read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .into_iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn required_timestamp(value: Option<String>, field: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = required(value, field)?;
    parse_timestamp(&raw).ok_or_else(|| invalid(format!("malformed {field}: {raw}")))
}

// =============================================================================
// Payments
// =============================================================================

pub fn convert_payment_intent(dto: PaymentIntentResponse) -> Result<PaymentIntent, ApiError> {
    let id = required(dto.payment_intent_id, "payment_intent_id")?;
    let client_secret = required(dto.client_secret, "client_secret")?;
    Ok(PaymentIntent {
        id: PaymentIntentId::new(id),
        client_secret: SecretString::from(client_secret),
    })
}

pub fn convert_payment_intent_state(
    dto: PaymentIntentStatusResponse,
) -> Result<PaymentIntentState, ApiError> {
    let id = required(dto.id, "payment intent id")?;
    let status = PaymentIntentStatus::from(required(dto.status, "payment intent status")?.as_str());
    let amount = non_negative(dto.amount, "payment intent amount")?;
    let currency = match non_blank(dto.currency) {
        Some(code) => code
            .parse::<CurrencyCode>()
            .map_err(|e| invalid(e.to_string()))?,
        None => CurrencyCode::default(),
    };

    Ok(PaymentIntentState {
        id: PaymentIntentId::new(id),
        status,
        amount: Price::new(amount, currency),
    })
}

// =============================================================================
// Orders
// =============================================================================

fn convert_order_item(dto: OrderItemDto) -> Result<OrderItem, ApiError> {
    let product_id = required(dto.product_id, "item product_id")?;
    let quantity = dto
        .quantity
        .ok_or_else(|| invalid("missing item quantity"))
        .and_then(|q| {
            u32::try_from(q)
                .ok()
                .filter(|q| *q > 0)
                .ok_or_else(|| invalid(format!("invalid item quantity: {q}")))
        })?;

    Ok(OrderItem {
        product_name: non_blank(dto.product_name).unwrap_or_else(|| product_id.clone()),
        product_id: ProductId::new(product_id),
        unit_price: non_negative(dto.price, "item price")?,
        quantity,
        size: non_blank(dto.size),
        color: non_blank(dto.color),
        image: non_blank(dto.image),
    })
}

fn convert_order_shipping(dto: &OrderDto) -> Option<ShippingInfo> {
    let info = ShippingInfo {
        address: dto.shipping_address.clone()?,
        city: dto.shipping_city.clone()?,
        postal_code: dto.shipping_postal_code.clone()?,
        country: dto.shipping_country.clone()?,
        phone: non_blank(dto.shipping_phone.clone()),
    };
    info.missing_fields().is_empty().then_some(info)
}

pub fn convert_order(dto: OrderDto) -> Result<Order, ApiError> {
    let shipping = convert_order_shipping(&dto);

    let id = required(dto.id, "order id")?;
    let user_email = required(dto.user_email, "user_email")?;
    let user_email = Email::parse(&user_email)
        .map_err(|e| invalid(format!("order {id} user_email: {e}")))?;
    let status = required(dto.status, "order status")?
        .parse::<OrderStatus>()
        .map_err(|e| invalid(format!("order {id}: {e}")))?;
    let items = dto
        .items
        .into_iter()
        .map(convert_order_item)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Order {
        user_id: UserId::new(required(dto.user_id, "user_id")?),
        user_email,
        user_name: non_blank(dto.user_name),
        items,
        total_amount: non_negative(dto.total_amount, "total_amount")?,
        status,
        shipping,
        created_at: required_timestamp(dto.created_at, "created_at")?,
        updated_at: required_timestamp(dto.updated_at, "updated_at")?,
        notes: non_blank(dto.notes),
        payment_intent_id: non_blank(dto.payment_intent_id).map(PaymentIntentId::new),
        payment_status: non_blank(dto.payment_status),
        id: OrderId::new(id),
    })
}

pub fn convert_orders(dtos: Vec<OrderDto>) -> Result<Vec<Order>, ApiError> {
    dtos.into_iter().map(convert_order).collect()
}

fn order_item_to_dto(item: &OrderItem) -> OrderItemDto {
    OrderItemDto {
        product_id: Some(item.product_id.to_string()),
        product_name: Some(item.product_name.clone()),
        price: Some(item.unit_price),
        quantity: Some(i64::from(item.quantity)),
        size: item.size.clone(),
        color: item.color.clone(),
        image: item.image.clone(),
    }
}

pub fn new_order_to_request(order: &NewOrder) -> OrderCreateRequest {
    let shipping = order.shipping.normalized();
    OrderCreateRequest {
        items: order.items.iter().map(order_item_to_dto).collect(),
        shipping: ShippingDto {
            address: shipping.address,
            city: shipping.city,
            postal_code: shipping.postal_code,
            country: shipping.country,
            phone: shipping.phone,
        },
        notes: order.notes.clone(),
        payment_intent_id: order.payment_intent_id.as_ref().map(ToString::to_string),
    }
}

// =============================================================================
// Products
// =============================================================================

fn convert_gender(value: Option<String>) -> Result<Option<Gender>, ApiError> {
    match non_blank(value).as_deref() {
        None => Ok(None),
        Some("male") => Ok(Some(Gender::Male)),
        Some("female") => Ok(Some(Gender::Female)),
        Some("unisex") => Ok(Some(Gender::Unisex)),
        Some(other) => Err(invalid(format!("unknown gender: {other}"))),
    }
}

pub fn convert_product(dto: ProductDto) -> Result<Product, ApiError> {
    let id = required(dto.id, "product id")?;
    let stock = match dto.stock {
        None => 0,
        Some(s) => u32::try_from(s).map_err(|_| invalid(format!("product {id}: invalid stock {s}")))?,
    };

    Ok(Product {
        name: required(dto.name, "product name")?,
        description: non_blank(dto.description),
        price: non_negative(dto.price, "product price")?,
        stock,
        sizes: dto.sizes,
        available_sizes: dto.available_sizes,
        gender: convert_gender(dto.gender)?,
        category: non_blank(dto.category),
        colors: dto.colors,
        available_colors: dto.available_colors,
        images: dto.images,
        visible_images: dto.visible_images,
        created_at: dto.created_at.as_deref().and_then(parse_timestamp),
        id: ProductId::new(id),
    })
}

pub fn convert_products(dtos: Vec<ProductDto>) -> Result<Vec<Product>, ApiError> {
    dtos.into_iter().map(convert_product).collect()
}
