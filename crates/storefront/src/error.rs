//! Unified error handling with Sentry integration.
//!
//! Each layer has its own error enum ([`CartError`], [`ApiError`],
//! [`SelectionError`], [`CheckoutError`], [`ConfigError`]);
//! [`StorefrontError`] unifies them for callers that drive several layers at
//! once, such as the CLI.

use thiserror::Error;

use crate::api::{ApiError, SelectionError};
use crate::cart::CartError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;

/// Application-level error type for the storefront core.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Cart operation rejected or not persisted.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Remote API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Size, color or stock selection is not available for the product.
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    /// Checkout step failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl StorefrontError {
    /// Whether the error indicates a fault outside the user's control.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Cart(err) => !err.is_validation(),
            Self::Selection(_) => false,
            Self::Api(_) | Self::Config(_) => true,
            Self::Checkout(err) => err.is_critical(),
        }
    }

    /// Capture reportable errors to Sentry, returning the event ID.
    ///
    /// Validation errors are expected and are not reported.
    pub fn report(&self) -> Option<sentry::types::Uuid> {
        self.is_reportable().then(|| sentry::capture_error(self))
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Payment intent created", Some(&[("amount", "30.00")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

/// Escalate a payment that was captured without an order being recorded.
///
/// Logged at `error` and captured to Sentry with the payment intent ID so the
/// payment can be reconciled manually.
pub fn report_unrecorded_payment(payment_intent_id: &str, reason: &str) {
    sentry::with_scope(
        |scope| {
            scope.set_tag("checkout.failure", "order_not_recorded");
            scope.set_extra(
                "payment_intent_id",
                serde_json::Value::String(payment_intent_id.to_string()),
            );
        },
        || {
            let event_id = sentry::capture_message(
                "Payment captured but order creation failed",
                sentry::Level::Fatal,
            );
            tracing::error!(
                payment_intent_id,
                reason,
                sentry_event_id = %event_id,
                "Payment captured but order creation failed; manual reconciliation required"
            );
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::LineKey;

    #[test]
    fn test_storefront_error_display() {
        let err = StorefrontError::from(CartError::InvalidQuantity { requested: 0 });
        assert_eq!(
            err.to_string(),
            "Cart error: quantity must be at least 1 (requested 0)"
        );

        let err = StorefrontError::from(ApiError::NotFound("/orders/o-1".to_string()));
        assert_eq!(err.to_string(), "API error: Not found: /orders/o-1");
    }

    #[test]
    fn test_validation_errors_are_not_reported() {
        let err = StorefrontError::from(CartError::LineNotFound(LineKey::new("p1", "M", None)));
        assert!(!err.is_reportable());
        assert!(err.report().is_none());

        let err = StorefrontError::from(CartError::TotalOverflow);
        assert!(!err.is_reportable());
    }

    #[test]
    fn test_report_does_not_panic_without_client() {
        let err = StorefrontError::from(ApiError::RateLimited(5));
        assert!(err.is_reportable());
        assert!(err.report().is_some());
        report_unrecorded_payment("pi_123", "HTTP 500");
    }
}
