//! Cart commands over the file-backed cart slot.

use std::fmt::Write;

use mambini_storefront::AppState;
use mambini_storefront::cart::{CartSnapshot, LineKey};
use mambini_storefront::error::Result;

/// Render the cart as a table with totals.
#[must_use]
pub fn render(snapshot: &CartSnapshot, state: &AppState) -> String {
    if snapshot.is_empty() {
        return "Cart is empty".to_string();
    }

    let mut out = String::new();
    for line in &snapshot.items {
        let color = line.color.as_deref().unwrap_or("-");
        let _ = writeln!(
            out,
            "{:<24} {:<6} {:<10} {:>3} x {:>8.2} = {:>9.2}",
            line.name,
            line.size,
            color,
            line.quantity,
            line.unit_price,
            line.line_total(),
        );
    }
    let _ = write!(
        out,
        "{} items, total {}",
        snapshot.count,
        snapshot.total_price(state.config().currency)
    );
    out
}

#[must_use]
pub fn show(state: &AppState) -> String {
    render(&state.cart().snapshot(), state)
}

/// Fetch the product and add the selected option to the cart.
pub async fn add(
    state: &AppState,
    product_id: &str,
    size: &str,
    color: Option<&str>,
    quantity: u32,
) -> Result<String> {
    let product = state.api().get_product(&product_id.into()).await?;
    let input = product.to_cart_line(size, color, quantity)?;
    let key = input.key();
    state.cart().add_to_cart(input)?;

    tracing::info!(line = %key, quantity, "Added to cart");
    Ok(show(state))
}

pub fn remove(
    state: &AppState,
    product_id: String,
    size: String,
    color: Option<String>,
) -> Result<String> {
    state
        .cart()
        .remove_from_cart(&LineKey::new(product_id, size, color))?;
    Ok(show(state))
}

pub fn update(
    state: &AppState,
    product_id: String,
    size: String,
    color: Option<String>,
    delta: i64,
) -> Result<String> {
    let key = LineKey::new(product_id, size, color);
    let quantity = state.cart().update_quantity(&key, delta)?;
    tracing::info!(line = %key, quantity, "Quantity updated");
    Ok(show(state))
}

pub fn clear(state: &AppState) -> Result<String> {
    state.cart().clear_cart()?;
    Ok(show(state))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use mambini_storefront::cart::{CartLineInput, MemoryStorage};
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

    #[test]
    fn test_render_empty() {
        assert_eq!(show(&state()), "Cart is empty");
    }

    #[test]
    fn test_render_lines_and_total() {
        let state = state();
        state
            .cart()
            .add_to_cart(
                CartLineInput::new("p1", "Linen Jacket", Decimal::new(1000, 2), "M", 3)
                    .with_color("black"),
            )
            .unwrap();

        let out = show(&state);
        assert!(out.contains("Linen Jacket"));
        assert!(out.contains("black"));
        assert!(out.ends_with("3 items, total €30.00"));
    }

    #[test]
    fn test_update_rejects_non_positive() {
        let state = state();
        state
            .cart()
            .add_to_cart(CartLineInput::new("p1", "Jacket", Decimal::TEN, "M", 2))
            .unwrap();

        let err = update(&state, "p1".into(), "M".into(), None, -5).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
        assert_eq!(state.cart().snapshot().count, 2);

        clear(&state).unwrap();
        assert!(state.cart().snapshot().is_empty());
    }
}
