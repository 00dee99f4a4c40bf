//! Shipping details captured at checkout.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Country pre-filled on a new shipping form.
pub const DEFAULT_COUNTRY: &str = "Portugal";

/// A required shipping field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingField {
    Address,
    City,
    PostalCode,
    Country,
}

impl ShippingField {
    /// Field name as used in API bodies and form names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::City => "city",
            Self::PostalCode => "postal_code",
            Self::Country => "country",
        }
    }
}

impl fmt::Display for ShippingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an order is delivered.
///
/// `address`, `city`, `postal_code` and `country` are required and must be
/// non-blank; `phone` is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Default for ShippingInfo {
    fn default() -> Self {
        Self {
            address: String::new(),
            city: String::new(),
            postal_code: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
            phone: None,
        }
    }
}

impl ShippingInfo {
    /// Required fields that are empty or whitespace-only, in form order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<ShippingField> {
        [
            (ShippingField::Address, &self.address),
            (ShippingField::City, &self.city),
            (ShippingField::PostalCode, &self.postal_code),
            (ShippingField::Country, &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    /// Copy with surrounding whitespace removed and a blank phone dropped.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
            phone: self
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from),
        }
    }
}
