//! Domain types for the shop API.
//!
//! These are the validated shapes the rest of the crate works with; the raw
//! JSON bodies live in [`super::wire`].

use chrono::{DateTime, Utc};
use mambini_core::{
    CurrencyCode, Email, OrderId, OrderStatus, PaymentIntentId, PaymentIntentStatus, Price,
    ProductId, ShippingInfo, UserId,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{CartLine, CartLineInput, CartSnapshot};

// =============================================================================
// Payment Types
// =============================================================================

/// A freshly created payment intent.
///
/// The client secret is handed to the card processor and never logged.
#[derive(Clone)]
pub struct PaymentIntent {
    pub id: PaymentIntentId,
    pub client_secret: SecretString,
}

impl std::fmt::Debug for PaymentIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentIntent")
            .field("id", &self.id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Current state of a payment intent, for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentState {
    pub id: PaymentIntentId,
    pub status: PaymentIntentStatus,
    pub amount: Price,
}

// =============================================================================
// Order Types
// =============================================================================

/// One purchased line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub image: Option<String>,
}

impl OrderItem {
    /// `unit_price * quantity`, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price
            .checked_mul(Decimal::from(self.quantity))
            .unwrap_or(Decimal::MAX)
    }
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            product_name: line.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            size: Some(line.size.clone()).filter(|s| !s.is_empty()),
            color: line.color.clone(),
            image: Some(line.image.clone()).filter(|i| !i.is_empty()),
        }
    }
}

/// An order recorded by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_email: Email,
    pub user_name: Option<String>,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    /// Present when the order carries a complete shipping address.
    pub shipping: Option<ShippingInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub payment_intent_id: Option<PaymentIntentId>,
    pub payment_status: Option<String>,
}

impl Order {
    /// Total as a price in the given currency.
    #[must_use]
    pub const fn total_price(&self, currency: CurrencyCode) -> Price {
        Price::new(self.total_amount, currency)
    }

    /// Number of units across all items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

/// Request to record a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub items: Vec<OrderItem>,
    pub shipping: ShippingInfo,
    pub notes: Option<String>,
    pub payment_intent_id: Option<PaymentIntentId>,
}

impl NewOrder {
    /// Build an order request from the cart's current lines.
    ///
    /// Blank notes are dropped.
    #[must_use]
    pub fn from_cart(
        cart: &CartSnapshot,
        shipping: ShippingInfo,
        notes: Option<String>,
        payment_intent_id: Option<PaymentIntentId>,
    ) -> Self {
        Self {
            items: cart.items.iter().map(OrderItem::from).collect(),
            shipping,
            notes: notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            payment_intent_id,
        }
    }
}

// =============================================================================
// Product Types
// =============================================================================

/// Intended audience of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unisex,
}

impl Gender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unisex => "unisex",
        }
    }
}

/// Why a product option cannot be added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("size '{0}' is not available")]
    SizeUnavailable(String),

    #[error("color '{0}' is not available")]
    ColorUnavailable(String),

    #[error("product is out of stock")]
    OutOfStock,
}

/// A catalogue product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: u32,
    pub sizes: Vec<String>,
    pub available_sizes: Vec<String>,
    pub gender: Option<Gender>,
    pub category: Option<String>,
    pub colors: Vec<String>,
    pub available_colors: Vec<String>,
    pub images: Vec<String>,
    pub visible_images: Option<Vec<String>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Images to show, honoring the curated subset when one is set.
    #[must_use]
    pub fn display_images(&self) -> &[String] {
        match &self.visible_images {
            Some(visible) if !visible.is_empty() => visible,
            _ => &self.images,
        }
    }

    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.display_images().first().map(String::as_str)
    }

    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Sizes a shopper may pick.
    #[must_use]
    pub fn selectable_sizes(&self) -> &[String] {
        if self.available_sizes.is_empty() {
            &self.sizes
        } else {
            &self.available_sizes
        }
    }

    /// Colors a shopper may pick.
    #[must_use]
    pub fn selectable_colors(&self) -> &[String] {
        if self.available_colors.is_empty() {
            &self.colors
        } else {
            &self.available_colors
        }
    }

    /// Turn a size/color selection into a cart line input.
    ///
    /// The product's stock becomes the line's advisory stock limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is out of stock or the size or color
    /// is not offered.
    pub fn to_cart_line(
        &self,
        size: &str,
        color: Option<&str>,
        quantity: u32,
    ) -> Result<CartLineInput, SelectionError> {
        if !self.is_in_stock() {
            return Err(SelectionError::OutOfStock);
        }

        let sizes = self.selectable_sizes();
        if !sizes.is_empty() && !sizes.iter().any(|s| s == size) {
            return Err(SelectionError::SizeUnavailable(size.to_string()));
        }

        let color = color.map(str::trim).filter(|c| !c.is_empty());
        if let Some(color) = color
            && !self.selectable_colors().iter().any(|c| c == color)
        {
            return Err(SelectionError::ColorUnavailable(color.to_string()));
        }

        let mut input = CartLineInput::new(self.id.clone(), &self.name, self.price, size, quantity)
            .with_stock_limit(self.stock);
        if let Some(image) = self.primary_image() {
            input = input.with_image(image);
        }
        if let Some(color) = color {
            input = input.with_color(color);
        }
        Ok(input)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn jacket() -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Linen Jacket".to_string(),
            description: None,
            price: Decimal::new(4999, 2),
            stock: 3,
            sizes: vec!["S".to_string(), "M".to_string(), "L".to_string()],
            available_sizes: vec!["M".to_string(), "L".to_string()],
            gender: Some(Gender::Unisex),
            category: Some("jackets".to_string()),
            colors: vec!["black".to_string(), "sand".to_string()],
            available_colors: vec![],
            images: vec!["a.jpg".to_string(), "b.jpg".to_string()],
            visible_images: None,
            created_at: None,
        }
    }

    #[test]
    fn test_to_cart_line_carries_stock_and_image() {
        let input = jacket().to_cart_line("M", Some("black"), 2).unwrap();
        assert_eq!(input.product_id.as_str(), "p1");
        assert_eq!(input.unit_price, Decimal::new(4999, 2));
        assert_eq!(input.stock_limit, Some(3));
        assert_eq!(input.image, "a.jpg");
        assert_eq!(input.color.as_deref(), Some("black"));
        assert_eq!(input.quantity, 2);
    }

    #[test]
    fn test_to_cart_line_rejects_unavailable_size() {
        assert_eq!(
            jacket().to_cart_line("S", None, 1).unwrap_err(),
            SelectionError::SizeUnavailable("S".to_string())
        );
    }

    #[test]
    fn test_to_cart_line_rejects_unknown_color() {
        assert_eq!(
            jacket().to_cart_line("M", Some("pink"), 1).unwrap_err(),
            SelectionError::ColorUnavailable("pink".to_string())
        );
    }

    #[test]
    fn test_to_cart_line_blank_color_is_none() {
        let input = jacket().to_cart_line("M", Some("  "), 1).unwrap();
        assert!(input.color.is_none());
    }

    #[test]
    fn test_to_cart_line_out_of_stock() {
        let product = Product {
            stock: 0,
            ..jacket()
        };
        assert_eq!(
            product.to_cart_line("M", None, 1).unwrap_err(),
            SelectionError::OutOfStock
        );
    }

    #[test]
    fn test_visible_images_take_precedence() {
        let product = Product {
            visible_images: Some(vec!["hero.jpg".to_string()]),
            ..jacket()
        };
        assert_eq!(product.primary_image(), Some("hero.jpg"));

        let product = Product {
            visible_images: Some(vec![]),
            ..jacket()
        };
        assert_eq!(product.primary_image(), Some("a.jpg"));
    }

    #[test]
    fn test_new_order_from_cart_drops_blank_notes() {
        let line = CartLineInput::new("p1", "Linen Jacket", Decimal::new(4999, 2), "M", 2)
            .with_image("a.jpg")
            .into_line();
        let snapshot = CartSnapshot::from_lines(&[line]);

        let order = NewOrder::from_cart(&snapshot, ShippingInfo::default(), Some("  ".into()), None);
        assert!(order.notes.is_none());
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].line_total(), Decimal::new(9998, 2));
        assert_eq!(order.items[0].image.as_deref(), Some("a.jpg"));
        assert!(order.items[0].color.is_none());
    }

    #[test]
    fn test_payment_intent_debug_redacts_secret() {
        let intent = PaymentIntent {
            id: PaymentIntentId::new("pi_1"),
            client_secret: SecretString::from("pi_1_secret_abc"),
        };
        let debug = format!("{intent:?}");
        assert!(debug.contains("pi_1"));
        assert!(!debug.contains("secret_abc"));
    }
}
