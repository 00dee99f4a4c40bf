//! Checkout session state machine.
//!
//! Every transition is a synchronous method that either applies fully or
//! returns an error without changing the session. Network calls sit between
//! a `begin_*` transition, which marks the call in flight and hands out a
//! [`Ticket`], and the matching `complete_*` transition, which only accepts
//! the ticket if the session has not been reset since.

use core::fmt;

use mambini_core::{CurrencyCode, PaymentIntentId, Price, ShippingInfo};
use secrecy::SecretString;
use serde::Serialize;
use uuid::Uuid;

use super::error::CheckoutError;
use crate::api::{ApiError, NewOrder, Order, PaymentIntent};
use crate::cart::CartSnapshot;

/// Where a checkout session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Shipping,
    Payment,
    Completed,
    Failed,
}

impl CheckoutStep {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shipping => "shipping",
            Self::Payment => "payment",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A network call the session is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingCall {
    CreatePaymentIntent,
    CreateOrder,
}

/// Proof that a call was started by a particular session generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Ticket {
    session_id: Uuid,
    generation: u64,
    call: PendingCall,
}

/// Read-only view of a session for rendering.
#[derive(Debug, Clone)]
pub struct CheckoutState {
    pub session_id: Uuid,
    pub step: CheckoutStep,
    pub shipping: ShippingInfo,
    pub notes: Option<String>,
    pub amount: Option<Price>,
    pub payment_intent_id: Option<PaymentIntentId>,
    /// Handed to the card processor while in the payment step.
    pub client_secret: Option<SecretString>,
    pub last_error: Option<String>,
    /// Set while a call is in flight; submit controls should be disabled.
    pub in_flight: Option<PendingCall>,
    pub order: Option<Order>,
}

impl CheckoutState {
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }
}

/// One checkout attempt.
#[derive(Debug)]
pub struct CheckoutSession {
    id: Uuid,
    generation: u64,
    step: CheckoutStep,
    shipping: ShippingInfo,
    notes: Option<String>,
    amount: Option<Price>,
    payment: Option<PaymentIntent>,
    confirmed_payment: Option<PaymentIntentId>,
    last_error: Option<String>,
    in_flight: Option<PendingCall>,
    order: Option<Order>,
    cart_cleared: bool,
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutSession {
    /// A fresh session in the shipping step with an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            generation: 0,
            step: CheckoutStep::Shipping,
            shipping: ShippingInfo::default(),
            notes: None,
            amount: None,
            payment: None,
            confirmed_payment: None,
            last_error: None,
            in_flight: None,
            order: None,
            cart_cleared: false,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    #[must_use]
    pub const fn in_flight(&self) -> Option<PendingCall> {
        self.in_flight
    }

    /// The payment intent awaiting confirmation, if any.
    #[must_use]
    pub const fn payment(&self) -> Option<&PaymentIntent> {
        self.payment.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> CheckoutState {
        CheckoutState {
            session_id: self.id,
            step: self.step,
            shipping: self.shipping.clone(),
            notes: self.notes.clone(),
            amount: self.amount,
            payment_intent_id: self
                .payment
                .as_ref()
                .map(|p| p.id.clone())
                .or_else(|| self.confirmed_payment.clone()),
            client_secret: self.payment.as_ref().map(|p| p.client_secret.clone()),
            last_error: self.last_error.clone(),
            in_flight: self.in_flight,
            order: self.order.clone(),
        }
    }

    fn ensure_step(&self, expected: CheckoutStep, operation: &'static str) -> Result<(), CheckoutError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(CheckoutError::InvalidTransition {
                step: self.step,
                operation,
            })
        }
    }

    const fn ensure_idle(&self) -> Result<(), CheckoutError> {
        if self.in_flight.is_some() {
            Err(CheckoutError::Busy)
        } else {
            Ok(())
        }
    }

    fn fail(&mut self, err: CheckoutError) -> CheckoutError {
        self.last_error = Some(err.user_message());
        err
    }

    const fn ticket(&self, call: PendingCall) -> Ticket {
        Ticket {
            session_id: self.id,
            generation: self.generation,
            call,
        }
    }

    fn accept(&mut self, ticket: Ticket) -> Result<(), CheckoutError> {
        let current = ticket.session_id == self.id
            && ticket.generation == self.generation
            && self.in_flight == Some(ticket.call);
        if !current {
            return Err(CheckoutError::SessionDiscarded);
        }
        self.in_flight = None;
        Ok(())
    }

    // =========================================================================
    // Draft editing
    // =========================================================================

    /// Replace the shipping draft.
    ///
    /// # Errors
    ///
    /// Only allowed in the shipping step with no call in flight.
    pub fn set_shipping(&mut self, shipping: ShippingInfo) -> Result<(), CheckoutError> {
        self.ensure_idle()?;
        self.ensure_step(CheckoutStep::Shipping, "edit shipping")?;
        self.shipping = shipping;
        Ok(())
    }

    /// Set delivery notes; blank clears them.
    ///
    /// # Errors
    ///
    /// Not allowed once order creation has started.
    pub fn set_notes(&mut self, notes: Option<String>) -> Result<(), CheckoutError> {
        self.ensure_idle()?;
        if self.step.is_terminal() {
            return Err(CheckoutError::InvalidTransition {
                step: self.step,
                operation: "edit notes",
            });
        }
        self.notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        Ok(())
    }

    // =========================================================================
    // Shipping -> Payment
    // =========================================================================

    /// Validate shipping and the cart, and start payment intent creation for
    /// the cart's current total.
    ///
    /// # Errors
    ///
    /// `Busy`, `InvalidTransition`, `EmptyCart` or `InvalidShipping`; the
    /// session is unchanged apart from `last_error`.
    pub fn begin_payment_intent(
        &mut self,
        shipping: ShippingInfo,
        cart: &CartSnapshot,
        currency: CurrencyCode,
    ) -> Result<(Ticket, Price), CheckoutError> {
        self.ensure_idle()?;
        self.ensure_step(CheckoutStep::Shipping, "submit shipping")?;

        if cart.is_empty() {
            return Err(self.fail(CheckoutError::EmptyCart));
        }
        let missing = shipping.missing_fields();
        if !missing.is_empty() {
            self.shipping = shipping;
            return Err(self.fail(CheckoutError::InvalidShipping(missing)));
        }

        let amount = cart.total_price(currency);
        self.shipping = shipping.normalized();
        self.amount = Some(amount);
        self.last_error = None;
        self.in_flight = Some(PendingCall::CreatePaymentIntent);
        Ok((self.ticket(PendingCall::CreatePaymentIntent), amount))
    }

    /// Apply the gateway's answer to payment intent creation.
    ///
    /// # Errors
    ///
    /// `SessionDiscarded` for a stale ticket; `PaymentIntentCreationFailed`
    /// if the gateway rejected the request, in which case the session stays
    /// in the shipping step.
    pub fn complete_payment_intent(
        &mut self,
        ticket: Ticket,
        result: Result<PaymentIntent, ApiError>,
    ) -> Result<(), CheckoutError> {
        self.accept(ticket)?;
        match result {
            Ok(intent) => {
                self.payment = Some(intent);
                self.step = CheckoutStep::Payment;
                Ok(())
            }
            Err(e) => {
                self.amount = None;
                Err(self.fail(CheckoutError::PaymentIntentCreationFailed(e.to_string())))
            }
        }
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Record a failed confirmation. The intent is kept for a retry.
    ///
    /// # Errors
    ///
    /// Always returns an error: `PaymentConfirmationFailed` when recorded,
    /// or `Busy`/`InvalidTransition` when not applicable.
    pub fn payment_failed(&mut self, reason: &str) -> CheckoutError {
        if let Err(e) = self
            .ensure_idle()
            .and_then(|()| self.ensure_step(CheckoutStep::Payment, "fail payment"))
        {
            return e;
        }
        self.fail(CheckoutError::PaymentConfirmationFailed(reason.to_string()))
    }

    /// Start order creation for a confirmed payment.
    ///
    /// # Errors
    ///
    /// `Busy`, `InvalidTransition`, or `PaymentConfirmationFailed` if the
    /// confirmation is for another intent.
    pub fn begin_order(
        &mut self,
        confirmed: &PaymentIntentId,
        cart: &CartSnapshot,
    ) -> Result<(Ticket, NewOrder), CheckoutError> {
        self.ensure_idle()?;
        self.ensure_step(CheckoutStep::Payment, "create the order")?;

        let matches = self.payment.as_ref().is_some_and(|p| &p.id == confirmed);
        if !matches {
            return Err(self.fail(CheckoutError::PaymentConfirmationFailed(format!(
                "confirmation is for unknown payment {confirmed}"
            ))));
        }

        let order = NewOrder::from_cart(
            cart,
            self.shipping.clone(),
            self.notes.clone(),
            Some(confirmed.clone()),
        );
        self.confirmed_payment = Some(confirmed.clone());
        self.last_error = None;
        self.in_flight = Some(PendingCall::CreateOrder);
        Ok((self.ticket(PendingCall::CreateOrder), order))
    }

    /// Apply the gateway's answer to order creation.
    ///
    /// Success enters `Completed`; failure enters `Failed` since the payment
    /// has already been captured.
    ///
    /// # Errors
    ///
    /// `SessionDiscarded` for a stale ticket, or `OrderCreationFailed`.
    pub fn complete_order(
        &mut self,
        ticket: Ticket,
        result: Result<Order, ApiError>,
    ) -> Result<(), CheckoutError> {
        self.accept(ticket)?;
        self.payment = None;
        match result {
            Ok(order) => {
                self.order = Some(order);
                self.step = CheckoutStep::Completed;
                Ok(())
            }
            Err(e) => {
                self.step = CheckoutStep::Failed;
                let payment_intent_id = self
                    .confirmed_payment
                    .clone()
                    .unwrap_or_else(|| PaymentIntentId::new("unknown"));
                Err(self.fail(CheckoutError::OrderCreationFailed {
                    payment_intent_id,
                    reason: e.to_string(),
                }))
            }
        }
    }

    /// Returns `true` exactly once after the session completes; the caller
    /// clears the cart when it does.
    pub const fn take_cart_clear(&mut self) -> bool {
        if matches!(self.step, CheckoutStep::Completed) && !self.cart_cleared {
            self.cart_cleared = true;
            true
        } else {
            false
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Return to the shipping step, discarding the payment intent.
    ///
    /// Any in-flight payment intent request is invalidated; its result will
    /// be rejected as stale.
    ///
    /// # Errors
    ///
    /// `Busy` while the order is being created, `InvalidTransition` once the
    /// session has ended.
    pub fn back(&mut self) -> Result<(), CheckoutError> {
        if self.in_flight == Some(PendingCall::CreateOrder) {
            return Err(CheckoutError::Busy);
        }
        if self.step.is_terminal() {
            return Err(CheckoutError::InvalidTransition {
                step: self.step,
                operation: "go back",
            });
        }

        self.generation += 1;
        self.step = CheckoutStep::Shipping;
        self.payment = None;
        self.amount = None;
        self.in_flight = None;
        self.last_error = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::cart::CartLineInput;

    fn cart() -> CartSnapshot {
        let line = CartLineInput::new("p1", "Jacket", Decimal::TEN, "M", 3).into_line();
        CartSnapshot::from_lines(&[line])
    }

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            address: "Rua Augusta 10".to_string(),
            city: "Lisboa".to_string(),
            postal_code: "1100-053".to_string(),
            ..ShippingInfo::default()
        }
    }

    fn intent(id: &str) -> PaymentIntent {
        PaymentIntent {
            id: PaymentIntentId::new(id),
            client_secret: SecretString::from(format!("{id}_secret")),
        }
    }

    fn rejected() -> ApiError {
        ApiError::Status {
            status: 500,
            detail: "boom".to_string(),
        }
    }

    fn in_payment() -> CheckoutSession {
        let mut session = CheckoutSession::new();
        let (ticket, _) = session
            .begin_payment_intent(shipping(), &cart(), CurrencyCode::EUR)
            .unwrap();
        session.complete_payment_intent(ticket, Ok(intent("pi_1"))).unwrap();
        session
    }

    #[test]
    fn test_new_session_defaults() {
        let state = CheckoutSession::new().state();
        assert_eq!(state.step, CheckoutStep::Shipping);
        assert_eq!(state.shipping.country, "Portugal");
        assert!(!state.is_busy());
    }

    #[test]
    fn test_empty_cart_rejected_first() {
        let mut session = CheckoutSession::new();
        let err = session
            .begin_payment_intent(ShippingInfo::default(), &CartSnapshot::default(), CurrencyCode::EUR)
            .unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart);
        assert!(session.in_flight().is_none());
        assert!(session.state().last_error.is_some());
    }

    #[test]
    fn test_invalid_shipping_keeps_draft() {
        let mut session = CheckoutSession::new();
        let draft = ShippingInfo {
            city: String::new(),
            ..shipping()
        };
        let err = session
            .begin_payment_intent(draft.clone(), &cart(), CurrencyCode::EUR)
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidShipping(ref f) if f.len() == 1));
        assert_eq!(session.state().shipping, draft);
        assert_eq!(session.step(), CheckoutStep::Shipping);
    }

    #[test]
    fn test_amount_taken_from_cart_total() {
        let mut session = CheckoutSession::new();
        let (_, amount) = session
            .begin_payment_intent(shipping(), &cart(), CurrencyCode::EUR)
            .unwrap();
        assert_eq!(amount.amount, Decimal::new(30, 0));
        assert_eq!(session.in_flight(), Some(PendingCall::CreatePaymentIntent));
    }

    #[test]
    fn test_busy_while_in_flight() {
        let mut session = CheckoutSession::new();
        let _ticket = session
            .begin_payment_intent(shipping(), &cart(), CurrencyCode::EUR)
            .unwrap();
        assert_eq!(
            session
                .begin_payment_intent(shipping(), &cart(), CurrencyCode::EUR)
                .unwrap_err(),
            CheckoutError::Busy
        );
    }

    #[test]
    fn test_intent_failure_stays_in_shipping() {
        let mut session = CheckoutSession::new();
        let (ticket, _) = session
            .begin_payment_intent(shipping(), &cart(), CurrencyCode::EUR)
            .unwrap();
        let err = session.complete_payment_intent(ticket, Err(rejected())).unwrap_err();

        assert!(matches!(err, CheckoutError::PaymentIntentCreationFailed(_)));
        assert_eq!(session.step(), CheckoutStep::Shipping);
        assert!(session.in_flight().is_none());
        assert!(session.payment().is_none());

        // Retry is just re-submitting
        assert!(session
            .begin_payment_intent(shipping(), &cart(), CurrencyCode::EUR)
            .is_ok());
    }

    #[test]
    fn test_payment_failed_keeps_intent() {
        let mut session = in_payment();
        let err = session.payment_failed("card declined");
        assert_eq!(
            err,
            CheckoutError::PaymentConfirmationFailed("card declined".to_string())
        );
        assert_eq!(session.step(), CheckoutStep::Payment);
        assert_eq!(session.payment().unwrap().id.as_str(), "pi_1");
    }

    #[test]
    fn test_back_discards_intent_and_stale_ticket() {
        let mut session = CheckoutSession::new();
        let (ticket, _) = session
            .begin_payment_intent(shipping(), &cart(), CurrencyCode::EUR)
            .unwrap();
        session.back().unwrap();

        assert_eq!(
            session.complete_payment_intent(ticket, Ok(intent("pi_stale"))),
            Err(CheckoutError::SessionDiscarded)
        );
        assert!(session.payment().is_none());
        assert_eq!(session.step(), CheckoutStep::Shipping);
    }

    #[test]
    fn test_back_from_payment_requires_new_intent() {
        let mut session = in_payment();
        session.back().unwrap();
        let state = session.state();
        assert_eq!(state.step, CheckoutStep::Shipping);
        assert!(state.payment_intent_id.is_none());
        assert!(state.client_secret.is_none());
    }

    #[test]
    fn test_order_success_completes_and_clears_once() {
        let mut session = in_payment();
        let (ticket, order) = session.begin_order(&PaymentIntentId::new("pi_1"), &cart()).unwrap();
        assert_eq!(order.payment_intent_id.as_ref().unwrap().as_str(), "pi_1");
        assert_eq!(session.back(), Err(CheckoutError::Busy));

        let recorded = Order {
            id: "o1".into(),
            user_id: "u1".into(),
            user_email: mambini_core::Email::parse("ana@mambini.pt").unwrap(),
            user_name: None,
            items: order.items,
            total_amount: Decimal::new(30, 0),
            status: mambini_core::OrderStatus::Pending,
            shipping: Some(order.shipping),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            notes: None,
            payment_intent_id: order.payment_intent_id,
            payment_status: None,
        };
        session.complete_order(ticket, Ok(recorded)).unwrap();

        assert_eq!(session.step(), CheckoutStep::Completed);
        assert!(session.take_cart_clear());
        assert!(!session.take_cart_clear());
        assert!(matches!(
            session.begin_order(&PaymentIntentId::new("pi_1"), &cart()),
            Err(CheckoutError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_order_failure_is_critical() {
        let mut session = in_payment();
        let (ticket, _) = session.begin_order(&PaymentIntentId::new("pi_1"), &cart()).unwrap();
        let err = session.complete_order(ticket, Err(rejected())).unwrap_err();

        assert!(err.is_critical());
        assert!(matches!(
            err,
            CheckoutError::OrderCreationFailed { ref payment_intent_id, .. }
                if payment_intent_id.as_str() == "pi_1"
        ));
        assert_eq!(session.step(), CheckoutStep::Failed);
        assert!(!session.take_cart_clear());
        assert_eq!(session.state().payment_intent_id.unwrap().as_str(), "pi_1");
    }

    #[test]
    fn test_confirmation_for_other_intent_rejected() {
        let mut session = in_payment();
        let err = session
            .begin_order(&PaymentIntentId::new("pi_other"), &cart())
            .unwrap_err();
        assert!(matches!(err, CheckoutError::PaymentConfirmationFailed(_)));
        assert!(session.in_flight().is_none());
    }

    #[test]
    fn test_notes_are_trimmed_and_carried() {
        let mut session = in_payment();
        session.set_notes(Some("  Ring twice ".to_string())).unwrap();
        let (_, order) = session.begin_order(&PaymentIntentId::new("pi_1"), &cart()).unwrap();
        assert_eq!(order.notes.as_deref(), Some("Ring twice"));
    }
}
