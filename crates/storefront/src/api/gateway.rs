//! Gateway trait used by checkout, and an in-memory implementation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use mambini_core::{Email, OrderId, OrderStatus, PaymentIntentId, Price, UserId};
use rust_decimal::Decimal;
use secrecy::SecretString;
use tokio::sync::Notify;

use super::types::{NewOrder, Order, OrderItem, PaymentIntent};
use super::{ApiClient, ApiError};

/// Remote operations the checkout depends on.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Create a payment intent for the given amount.
    async fn create_payment_intent(&self, amount: Price) -> Result<PaymentIntent, ApiError>;

    /// Record an order.
    async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError>;
}

#[async_trait]
impl Gateway for ApiClient {
    async fn create_payment_intent(&self, amount: Price) -> Result<PaymentIntent, ApiError> {
        Self::create_payment_intent(self, amount, None).await
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        Self::create_order(self, order).await
    }
}

#[async_trait]
impl<G: Gateway + ?Sized> Gateway for Arc<G> {
    async fn create_payment_intent(&self, amount: Price) -> Result<PaymentIntent, ApiError> {
        (**self).create_payment_intent(amount).await
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        (**self).create_order(order).await
    }
}

// =============================================================================
// InMemoryGateway
// =============================================================================

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    intents: Vec<Price>,
    orders: Vec<NewOrder>,
    next_id: u32,
    fail_intent: Option<String>,
    fail_order: Option<String>,
    held: bool,
}

/// In-memory gateway for testing.
///
/// Records every request, can be told to reject the next calls, and can hold
/// calls in flight until [`InMemoryGateway::release`] is called.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<Mutex<InMemoryGatewayState>>,
    release: Arc<Notify>,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryGatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reject payment intent creation with `detail` until cleared.
    pub fn fail_payment_intents(&self, detail: Option<&str>) {
        self.lock().fail_intent = detail.map(String::from);
    }

    /// Reject order creation with `detail` until cleared.
    pub fn fail_orders(&self, detail: Option<&str>) {
        self.lock().fail_order = detail.map(String::from);
    }

    /// Park subsequent calls until [`Self::release`].
    pub fn hold(&self) {
        self.lock().held = true;
    }

    /// Let held calls proceed and stop holding new ones.
    pub fn release(&self) {
        self.lock().held = false;
        self.release.notify_waiters();
    }

    /// Amounts of every payment intent created, in order.
    #[must_use]
    pub fn payment_intents(&self) -> Vec<Price> {
        self.lock().intents.clone()
    }

    /// Every order recorded, in order.
    #[must_use]
    pub fn orders(&self) -> Vec<NewOrder> {
        self.lock().orders.clone()
    }

    async fn wait_if_held(&self) {
        let notified = self.release.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a release in between is not missed.
        notified.as_mut().enable();
        let held = self.lock().held;
        if held {
            notified.await;
        }
    }

    fn rejection(detail: String) -> ApiError {
        ApiError::Status {
            status: 400,
            detail,
        }
    }
}

#[async_trait]
impl Gateway for InMemoryGateway {
    async fn create_payment_intent(&self, amount: Price) -> Result<PaymentIntent, ApiError> {
        self.wait_if_held().await;

        let mut state = self.lock();
        if let Some(detail) = state.fail_intent.clone() {
            return Err(Self::rejection(detail));
        }

        state.next_id += 1;
        let id = format!("pi_{:04}", state.next_id);
        state.intents.push(amount);

        Ok(PaymentIntent {
            client_secret: SecretString::from(format!("{id}_secret")),
            id: PaymentIntentId::new(id),
        })
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        self.wait_if_held().await;

        let mut state = self.lock();
        if let Some(detail) = state.fail_order.clone() {
            return Err(Self::rejection(detail));
        }

        state.next_id += 1;
        let id = format!("order-{:04}", state.next_id);
        state.orders.push(order.clone());

        let now = Utc::now();
        Ok(Order {
            id: OrderId::new(id),
            user_id: UserId::new("user-test"),
            user_email: Email::parse("test@mambini.pt")
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))?,
            user_name: None,
            total_amount: order
                .items
                .iter()
                .map(OrderItem::line_total)
                .fold(Decimal::ZERO, Decimal::saturating_add),
            items: order.items.clone(),
            status: OrderStatus::Pending,
            shipping: Some(order.shipping.clone()),
            created_at: now,
            updated_at: now,
            notes: order.notes.clone(),
            payment_intent_id: order.payment_intent_id.clone(),
            payment_status: None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use mambini_core::{CurrencyCode, ShippingInfo};

    use super::*;

    fn amount() -> Price {
        Price::new(Decimal::new(3000, 2), CurrencyCode::EUR)
    }

    #[tokio::test]
    async fn test_records_intents_and_orders() {
        let gateway = InMemoryGateway::new();
        let intent = gateway.create_payment_intent(amount()).await.unwrap();
        assert_eq!(intent.id.as_str(), "pi_0001");

        let order = NewOrder {
            items: vec![],
            shipping: ShippingInfo::default(),
            notes: None,
            payment_intent_id: Some(intent.id.clone()),
        };
        let created = gateway.create_order(&order).await.unwrap();
        assert_eq!(created.id.as_str(), "order-0002");
        assert_eq!(created.payment_intent_id, Some(intent.id));
        assert_eq!(gateway.payment_intents(), vec![amount()]);
        assert_eq!(gateway.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_rejections() {
        let gateway = InMemoryGateway::new();
        gateway.fail_payment_intents(Some("declined"));
        let err = gateway.create_payment_intent(amount()).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 400: declined");
        assert!(gateway.payment_intents().is_empty());

        gateway.fail_payment_intents(None);
        assert!(gateway.create_payment_intent(amount()).await.is_ok());
    }

    #[tokio::test]
    async fn test_hold_parks_calls_until_release() {
        let gateway = InMemoryGateway::new();
        gateway.hold();

        let task = tokio::spawn({
            let gateway = gateway.clone();
            async move { gateway.create_payment_intent(amount()).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());

        gateway.release();
        assert!(task.await.unwrap().is_ok());
    }
}
