//! Order commands.

use std::fmt::Write;

use mambini_core::{OrderId, OrderStatus};
use mambini_storefront::AppState;
use mambini_storefront::api::Order;
use mambini_storefront::error::Result;

/// One line per order, newest first.
#[must_use]
pub fn render_list(orders: &[Order], state: &AppState) -> String {
    if orders.is_empty() {
        return "No orders".to_string();
    }

    let mut sorted: Vec<&Order> = orders.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let currency = state.config().currency;
    sorted
        .into_iter()
        .map(|o| {
            format!(
                "{:<26} {}  {:<10} {:>3} items  {:>10}  {}",
                o.id.as_str(),
                o.created_at.format("%Y-%m-%d %H:%M"),
                o.status.as_str(),
                o.item_count(),
                o.total_price(currency).to_string(),
                o.user_email,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Order detail with items and shipping.
#[must_use]
pub fn render_detail(order: &Order, state: &AppState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Order {} ({})", order.id, order.status);
    let _ = writeln!(out, "Placed:   {}", order.created_at.to_rfc3339());
    let _ = writeln!(
        out,
        "Customer: {}{}",
        order.user_email,
        order
            .user_name
            .as_deref()
            .map(|n| format!(" ({n})"))
            .unwrap_or_default()
    );
    if let Some(payment) = &order.payment_intent_id {
        let _ = writeln!(
            out,
            "Payment:  {payment} {}",
            order.payment_status.as_deref().unwrap_or("")
        );
    }
    if let Some(shipping) = &order.shipping {
        let _ = writeln!(
            out,
            "Ship to:  {}, {} {}, {}",
            shipping.address, shipping.postal_code, shipping.city, shipping.country
        );
    }
    if let Some(notes) = &order.notes {
        let _ = writeln!(out, "Notes:    {notes}");
    }
    for item in &order.items {
        let options = [item.size.as_deref(), item.color.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("/");
        let _ = writeln!(
            out,
            "  {:>3} x {:<24} {:<10} {:>9.2}",
            item.quantity,
            item.product_name,
            options,
            item.line_total()
        );
    }
    let _ = write!(out, "Total:    {}", order.total_price(state.config().currency));
    out
}

pub async fn list(state: &AppState) -> Result<String> {
    let orders = state.api().list_my_orders().await?;
    Ok(render_list(&orders, state))
}

pub async fn list_all(state: &AppState) -> Result<String> {
    let orders = state.api().list_all_orders().await?;
    Ok(render_list(&orders, state))
}

pub async fn show(state: &AppState, id: &OrderId) -> Result<String> {
    let order = state.api().get_order(id).await?;
    Ok(render_detail(&order, state))
}

pub async fn set_status(state: &AppState, id: &OrderId, status: OrderStatus) -> Result<String> {
    let order = state.api().update_order_status(id, status).await?;
    tracing::info!(order_id = %order.id, status = %order.status, "Order status updated");
    Ok(render_detail(&order, state))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use mambini_core::{Email, ShippingInfo};
    use mambini_storefront::api::OrderItem;
    use mambini_storefront::cart::MemoryStorage;
    use mambini_storefront::config::{ApiConfig, StorefrontConfig};
    use rust_decimal::Decimal;

    use super::*;

    fn state() -> AppState {
        let config = StorefrontConfig {
            api: ApiConfig::new("http://localhost:8000").unwrap(),
            storage_dir: ".mambini".into(),
            currency: mambini_core::CurrencyCode::EUR,
            sentry_dsn: None,
            sentry_environment: None,
        };
        AppState::with_storage(config, Arc::new(MemoryStorage::new())).unwrap()
    }

    fn order(id: &str, day: u32) -> Order {
        let at = Utc.with_ymd_and_hms(2026, 3, day, 10, 0, 0).unwrap();
        Order {
            id: id.into(),
            user_id: "u1".into(),
            user_email: Email::parse("ana@mambini.pt").unwrap(),
            user_name: Some("Ana".to_string()),
            items: vec![OrderItem {
                product_id: "p1".into(),
                product_name: "Linen Jacket".to_string(),
                unit_price: Decimal::new(1500, 2),
                quantity: 2,
                size: Some("M".to_string()),
                color: None,
                image: None,
            }],
            total_amount: Decimal::new(3000, 2),
            status: OrderStatus::Shipped,
            shipping: Some(ShippingInfo {
                address: "Rua Augusta 10".to_string(),
                city: "Lisboa".to_string(),
                postal_code: "1100-053".to_string(),
                ..ShippingInfo::default()
            }),
            created_at: at,
            updated_at: at,
            notes: None,
            payment_intent_id: Some("pi_1".into()),
            payment_status: Some("succeeded".to_string()),
        }
    }

    #[test]
    fn test_list_is_newest_first() {
        let out = render_list(&[order("older", 1), order("newer", 2)], &state());
        let newer = out.find("newer").unwrap();
        let older = out.find("older").unwrap();
        assert!(newer < older);
        assert!(out.contains("shipped"));
    }

    #[test]
    fn test_detail_shows_shipping_and_total() {
        let out = render_detail(&order("o1", 1), &state());
        assert!(out.starts_with("Order o1 (shipped)"));
        assert!(out.contains("Rua Augusta 10, 1100-053 Lisboa, Portugal"));
        assert!(out.contains("pi_1 succeeded"));
        assert!(out.ends_with("Total:    €30.00"));
    }
}
