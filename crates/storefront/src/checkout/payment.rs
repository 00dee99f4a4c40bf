//! Mapping of card processor results.
//!
//! The processor's confirmation UI reports back either an error or the
//! confirmed payment intent. Only a `succeeded` intent counts as paid.

use mambini_core::{PaymentIntentId, PaymentIntentStatus};
use serde::Deserialize;

/// Error object reported by the processor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessorError {
    pub message: Option<String>,
    pub code: Option<String>,
}

/// Payment intent as reported by the processor after confirmation.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorIntent {
    pub id: PaymentIntentId,
    pub status: PaymentIntentStatus,
}

/// Raw result of a confirmation attempt.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessorResult {
    pub error: Option<ProcessorError>,
    #[serde(alias = "paymentIntent")]
    pub payment_intent: Option<ProcessorIntent>,
}

/// Terminal outcome of a confirmation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Funds captured for this intent.
    Confirmed(PaymentIntentId),
    /// Nothing was captured; the shopper may retry.
    Failed(String),
}

impl From<ProcessorResult> for PaymentOutcome {
    fn from(result: ProcessorResult) -> Self {
        if let Some(error) = result.error {
            let reason = error
                .message
                .filter(|m| !m.trim().is_empty())
                .or(error.code)
                .unwrap_or_else(|| "payment was declined".to_string());
            return Self::Failed(reason);
        }

        match result.payment_intent {
            Some(intent) if intent.status.is_succeeded() => Self::Confirmed(intent.id),
            Some(intent) => Self::Failed(format!("unexpected payment status: {}", intent.status)),
            None => Self::Failed("payment processor returned no result".to_string()),
        }
    }
}
