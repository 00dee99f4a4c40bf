//! Payment intent lookup for reconciling failed checkouts.

use mambini_core::PaymentIntentId;
use mambini_storefront::AppState;
use mambini_storefront::error::Result;

pub async fn status(state: &AppState, id: &PaymentIntentId) -> Result<String> {
    let intent = state.api().get_payment_intent(id).await?;
    let captured = if intent.status.is_succeeded() {
        "funds captured"
    } else {
        "not captured"
    };
    Ok(format!(
        "{}  {}  {} ({captured})",
        intent.id, intent.status, intent.amount
    ))
}
