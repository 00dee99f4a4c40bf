//! Cart line types and the derived cart snapshot.

use core::fmt;

use mambini_core::{CurrencyCode, Price, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identity of a cart line.
///
/// Two additions with the same product, size and color collapse into one
/// line. Color takes part in the identity so that a product bought in two
/// colors of the same size stays two lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product_id: ProductId,
    pub size: String,
    pub color: Option<String>,
}

impl LineKey {
    /// Create a key. An empty color is treated as no color.
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        size: impl Into<String>,
        color: Option<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            size: size.into(),
            color: normalize_color(color),
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.color {
            Some(color) => write!(f, "{}/{}/{}", self.product_id, self.size, color),
            None => write!(f, "{}/{}", self.product_id, self.size),
        }
    }
}

/// One distinct product/size/color combination in the cart.
///
/// The persisted form also accepts the field names written by older clients
/// (`id`, `price`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(alias = "id")]
    pub product_id: ProductId,
    pub name: String,
    #[serde(alias = "price")]
    pub unit_price: Decimal,
    #[serde(default)]
    pub image: String,
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub quantity: u32,
    /// Advisory maximum purchasable quantity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_limit: Option<u32>,
}

impl CartLine {
    /// The identity key of this line.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id.clone(),
            size: self.size.clone(),
            color: normalize_color(self.color.clone()),
        }
    }

    /// Whether this line has the given identity.
    #[must_use]
    pub fn matches(&self, key: &LineKey) -> bool {
        self.product_id == key.product_id
            && self.size == key.size
            && normalize_color_ref(self.color.as_deref())
                == normalize_color_ref(key.color.as_deref())
    }

    /// `unit_price * quantity`, or `None` if it overflows.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }

    /// `unit_price * quantity`, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.checked_line_total().unwrap_or(Decimal::MAX)
    }
}

/// Request to add a product to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineInput {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub image: String,
    pub size: String,
    pub color: Option<String>,
    pub quantity: u32,
    pub stock_limit: Option<u32>,
}

impl CartLineInput {
    /// Create an input with no image, color, or stock limit.
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Decimal,
        size: impl Into<String>,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            image: String::new(),
            size: size.into(),
            color: None,
            quantity,
            stock_limit: None,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = normalize_color(Some(color.into()));
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    #[must_use]
    pub const fn with_stock_limit(mut self, limit: u32) -> Self {
        self.stock_limit = Some(limit);
        self
    }

    /// The identity key the input will merge under.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id.clone(), self.size.clone(), self.color.clone())
    }

    pub(crate) fn into_line(self) -> CartLine {
        CartLine {
            product_id: self.product_id,
            name: self.name,
            unit_price: self.unit_price,
            image: self.image,
            size: self.size,
            color: normalize_color(self.color),
            quantity: self.quantity,
            stock_limit: self.stock_limit,
        }
    }
}

/// Read-only view of the cart with derived aggregates.
///
/// Built from the live line list on every call to
/// [`CartStore::snapshot`](super::CartStore::snapshot); never cached.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartSnapshot {
    /// Lines in insertion order.
    pub items: Vec<CartLine>,
    /// Sum of `unit_price * quantity` over all lines.
    pub total: Decimal,
    /// Sum of quantities over all lines.
    pub count: u64,
}

impl CartSnapshot {
    /// Build a snapshot. A total that overflows saturates at
    /// [`Decimal::MAX`]; [`CartStore`](super::CartStore) never holds such a
    /// cart.
    #[must_use]
    pub fn from_lines(lines: &[CartLine]) -> Self {
        let total = checked_total(lines).unwrap_or(Decimal::MAX);
        let count = lines.iter().map(|line| u64::from(line.quantity)).sum();
        Self {
            items: lines.to_vec(),
            total,
            count,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The total as a price in the given currency.
    #[must_use]
    pub const fn total_price(&self, currency: CurrencyCode) -> Price {
        Price::new(self.total, currency)
    }
}

/// Sum of line totals, or `None` if any line or the sum overflows.
pub(crate) fn checked_total(lines: &[CartLine]) -> Option<Decimal> {
    lines.iter().try_fold(Decimal::ZERO, |total, line| {
        total.checked_add(line.checked_line_total()?)
    })
}

fn normalize_color(color: Option<String>) -> Option<String> {
    color.filter(|c| !c.trim().is_empty())
}

fn normalize_color_ref(color: Option<&str>) -> Option<&str> {
    color.filter(|c| !c.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(product: &str, size: &str, color: Option<&str>, price: i64, qty: u32) -> CartLine {
        CartLineInput {
            color: color.map(String::from),
            ..CartLineInput::new(product, "Jacket", Decimal::new(price, 2), size, qty)
        }
        .into_line()
    }

    #[test]
    fn test_key_treats_empty_color_as_none() {
        let a = LineKey::new("p1", "M", Some(String::new()));
        let b = LineKey::new("p1", "M", None);
        assert_eq!(a, b);
        assert!(line("p1", "M", Some(""), 1000, 1).matches(&b));
    }

    #[test]
    fn test_key_distinguishes_colors() {
        let black = line("p1", "M", Some("black"), 1000, 1);
        assert!(black.matches(&LineKey::new("p1", "M", Some("black".into()))));
        assert!(!black.matches(&LineKey::new("p1", "M", Some("white".into()))));
        assert!(!black.matches(&LineKey::new("p1", "M", None)));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(LineKey::new("p1", "M", None).to_string(), "p1/M");
        assert_eq!(
            LineKey::new("p1", "M", Some("red".into())).to_string(),
            "p1/M/red"
        );
    }

    #[test]
    fn test_snapshot_aggregates() {
        let lines = vec![
            line("p1", "M", None, 1000, 3),
            line("p2", "L", Some("red"), 2599, 2),
        ];
        let snapshot = CartSnapshot::from_lines(&lines);
        assert_eq!(snapshot.total, Decimal::new(8198, 2));
        assert_eq!(snapshot.count, 5);
        assert_eq!(snapshot.items, lines);
        assert_eq!(
            snapshot.total_price(CurrencyCode::EUR).to_string(),
            "€81.98"
        );
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = CartSnapshot::from_lines(&[]);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.total, Decimal::ZERO);
        assert_eq!(snapshot.count, 0);
    }

    #[test]
    fn test_overflowing_totals_saturate() {
        let huge = CartLineInput::new("p1", "Jacket", Decimal::MAX, "M", 2).into_line();
        assert_eq!(huge.checked_line_total(), None);
        assert_eq!(huge.line_total(), Decimal::MAX);

        let one = CartLineInput::new("p2", "Scarf", Decimal::MAX, "M", 1).into_line();
        let lines = vec![one.clone(), one];
        assert_eq!(checked_total(&lines), None);

        let snapshot = CartSnapshot::from_lines(&lines);
        assert_eq!(snapshot.total, Decimal::MAX);
        assert_eq!(snapshot.count, 2);
    }

    #[test]
    fn test_legacy_field_names_deserialize() {
        let json = r#"{"id":"p1","name":"Jacket","price":29.99,"image":"a.jpg","size":"M","quantity":2}"#;
        let line: CartLine = serde_json::from_str(json).unwrap();
        assert_eq!(line.product_id.as_str(), "p1");
        assert_eq!(line.unit_price, Decimal::new(2999, 2));
        assert_eq!(line.color, None);
        assert_eq!(line.stock_limit, None);
    }
}
