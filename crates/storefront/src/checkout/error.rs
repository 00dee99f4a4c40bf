//! Checkout error taxonomy.

use mambini_core::{PaymentIntentId, ShippingField};
use thiserror::Error;

use super::CheckoutStep;

/// Errors surfaced by the checkout.
///
/// Gateway failures are converted into these at the orchestrator boundary;
/// no transport error reaches the caller directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// Required shipping fields are blank.
    #[error("missing shipping fields: {}", format_fields(.0))]
    InvalidShipping(Vec<ShippingField>),

    /// The gateway did not create a payment intent. Nothing was charged.
    #[error("payment intent creation failed: {0}")]
    PaymentIntentCreationFailed(String),

    /// The card processor reported a failed confirmation. Nothing was charged.
    #[error("payment confirmation failed: {0}")]
    PaymentConfirmationFailed(String),

    /// The payment was captured but the order could not be recorded.
    #[error("order creation failed after payment {payment_intent_id}: {reason}")]
    OrderCreationFailed {
        payment_intent_id: PaymentIntentId,
        reason: String,
    },

    /// Another checkout call is still in flight.
    #[error("a checkout request is already in progress")]
    Busy,

    /// The operation is not allowed in the current step.
    #[error("cannot {operation} during the {step} step")]
    InvalidTransition {
        step: CheckoutStep,
        operation: &'static str,
    },

    /// The session was reset or abandoned while the call was in flight.
    #[error("checkout session was discarded")]
    SessionDiscarded,
}

impl CheckoutError {
    /// Input problems the shopper can fix locally.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyCart | Self::InvalidShipping(_))
    }

    /// Payment captured without an order: needs manual reconciliation.
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        matches!(self, Self::OrderCreationFailed { .. })
    }

    /// Message suitable for showing to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyCart => "Your cart is empty.".to_string(),
            Self::InvalidShipping(fields) => {
                format!("Please fill in the shipping {}.", format_fields(fields))
            }
            Self::PaymentIntentCreationFailed(_) => {
                "We could not start the payment. You have not been charged, please try again."
                    .to_string()
            }
            Self::PaymentConfirmationFailed(reason) => {
                format!("Payment failed: {reason}. You have not been charged, please retry.")
            }
            Self::OrderCreationFailed {
                payment_intent_id, ..
            } => format!(
                "Your payment succeeded but we could not record your order. \
                 Please contact support and quote payment reference {payment_intent_id}."
            ),
            Self::Busy => "Please wait for the current step to finish.".to_string(),
            Self::InvalidTransition { .. } => "This action is not available right now.".to_string(),
            Self::SessionDiscarded => "This checkout was cancelled.".to_string(),
        }
    }
}

fn format_fields(fields: &[ShippingField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_shipping_lists_fields() {
        let err = CheckoutError::InvalidShipping(vec![ShippingField::City, ShippingField::PostalCode]);
        assert_eq!(err.to_string(), "missing shipping fields: city, postal_code");
        assert_eq!(err.user_message(), "Please fill in the shipping city, postal_code.");
        assert!(err.is_validation());
    }

    #[test]
    fn test_pre_and_post_payment_failures_are_distinct() {
        let before = CheckoutError::PaymentConfirmationFailed("card declined".to_string());
        let after = CheckoutError::OrderCreationFailed {
            payment_intent_id: PaymentIntentId::new("pi_1"),
            reason: "HTTP 500".to_string(),
        };

        assert!(!before.is_critical());
        assert!(after.is_critical());
        assert!(before.user_message().contains("not been charged"));
        assert!(after.user_message().contains("payment succeeded"));
        assert!(after.user_message().contains("pi_1"));
        assert_ne!(before.user_message(), after.user_message());
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = CheckoutError::InvalidTransition {
            step: CheckoutStep::Completed,
            operation: "go back",
        };
        assert_eq!(err.to_string(), "cannot go back during the completed step");
    }
}
