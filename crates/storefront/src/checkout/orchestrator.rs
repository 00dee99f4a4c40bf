//! Async driver for a checkout session.

use std::sync::{Mutex, MutexGuard, PoisonError};

use mambini_core::{CurrencyCode, OrderId, PaymentIntentId, ShippingInfo};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::error::CheckoutError;
use super::payment::PaymentOutcome;
use super::session::{CheckoutSession, CheckoutState, PendingCall};
use crate::api::Gateway;
use crate::cart::CartHandle;
use crate::error::{add_breadcrumb, report_unrecorded_payment};

struct Live {
    session: CheckoutSession,
    cancel: CancellationToken,
}

impl Live {
    fn fresh() -> Self {
        Self {
            session: CheckoutSession::new(),
            cancel: CancellationToken::new(),
        }
    }
}

/// Drives one live [`CheckoutSession`] against a [`Gateway`] and the cart.
///
/// The session lock is never held across an `.await`; when both are needed
/// the session is locked before the cart.
pub struct Checkout<G> {
    gateway: G,
    cart: CartHandle,
    currency: CurrencyCode,
    live: Mutex<Live>,
}

impl<G> std::fmt::Debug for Checkout<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let live = self.lock();
        f.debug_struct("Checkout")
            .field("session", &live.session.id())
            .field("step", &live.session.step())
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl<G> Checkout<G> {
    fn lock(&self) -> MutexGuard<'_, Live> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<G: Gateway> Checkout<G> {
    /// Start a checkout for `cart` in the shipping step.
    pub fn new(gateway: G, cart: CartHandle, currency: CurrencyCode) -> Self {
        Self {
            gateway,
            cart,
            currency,
            live: Mutex::new(Live::fresh()),
        }
    }

    /// Current view of the live session.
    #[must_use]
    pub fn state(&self) -> CheckoutState {
        self.lock().session.state()
    }

    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.lock().session.id()
    }

    /// Replace the shipping draft without submitting it.
    ///
    /// # Errors
    ///
    /// See [`CheckoutSession::set_shipping`].
    pub fn update_shipping(&self, shipping: ShippingInfo) -> Result<(), CheckoutError> {
        self.lock().session.set_shipping(shipping)
    }

    /// Set the delivery notes sent with the order.
    ///
    /// # Errors
    ///
    /// See [`CheckoutSession::set_notes`].
    pub fn set_notes(&self, notes: Option<String>) -> Result<(), CheckoutError> {
        self.lock().session.set_notes(notes)
    }

    /// Validate shipping and create a payment intent for the cart total.
    ///
    /// On success the session is in the payment step and the returned state
    /// carries the client secret for the card processor.
    ///
    /// # Errors
    ///
    /// Validation errors are returned without a network call. A gateway
    /// rejection returns [`CheckoutError::PaymentIntentCreationFailed`] and
    /// leaves the session in the shipping step. Returns
    /// [`CheckoutError::SessionDiscarded`] if the session was reset while the
    /// request was in flight.
    #[instrument(skip(self, shipping))]
    pub async fn submit_shipping(
        &self,
        shipping: ShippingInfo,
    ) -> Result<CheckoutState, CheckoutError> {
        let (ticket, amount, cancel) = {
            let mut live = self.lock();
            let snapshot = self.cart.snapshot();
            let (ticket, amount) =
                live.session
                    .begin_payment_intent(shipping, &snapshot, self.currency)?;
            (ticket, amount, live.cancel.clone())
        };

        info!(amount = %amount, "Creating payment intent");

        let result = tokio::select! {
            () = cancel.cancelled() => {
                info!("Payment intent request abandoned");
                return Err(CheckoutError::SessionDiscarded);
            }
            result = self.gateway.create_payment_intent(amount) => result,
        };

        if let Err(e) = &result {
            warn!(error = %e, "Payment intent creation failed");
        }

        let mut live = self.lock();
        live.session.complete_payment_intent(ticket, result)?;
        let state = live.session.state();
        drop(live);

        if let Some(id) = &state.payment_intent_id {
            add_breadcrumb(
                "checkout",
                "Payment intent created",
                Some(&[
                    ("payment_intent_id", id.as_str()),
                    ("amount", amount.amount.to_string().as_str()),
                ]),
            );
        }
        Ok(state)
    }

    /// Apply the card processor's result.
    ///
    /// # Errors
    ///
    /// See [`Self::payment_succeeded`] and [`Self::payment_failed`].
    pub async fn confirm_payment(
        &self,
        outcome: PaymentOutcome,
    ) -> Result<CheckoutState, CheckoutError> {
        match outcome {
            PaymentOutcome::Confirmed(id) => self.payment_succeeded(&id).await,
            PaymentOutcome::Failed(reason) => Err(self.payment_failed(&reason)),
        }
    }

    /// Record a declined or failed confirmation. The intent stays usable.
    pub fn payment_failed(&self, reason: &str) -> CheckoutError {
        let err = self.lock().session.payment_failed(reason);
        if matches!(err, CheckoutError::PaymentConfirmationFailed(_)) {
            info!(reason, "Payment confirmation failed");
            add_breadcrumb("checkout", "Payment failed", Some(&[("reason", reason)]));
        }
        err
    }

    /// Record the order for a confirmed payment and clear the cart.
    ///
    /// The order request is not cancelled by [`Self::back`] or
    /// [`Self::abandon`] once sent, since the payment has already been
    /// captured.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::OrderCreationFailed`] if the gateway rejects
    /// the order; this is reported for manual reconciliation.
    #[instrument(skip(self), fields(payment_intent_id = %payment_intent_id))]
    pub async fn payment_succeeded(
        &self,
        payment_intent_id: &PaymentIntentId,
    ) -> Result<CheckoutState, CheckoutError> {
        let (ticket, order) = {
            let mut live = self.lock();
            let snapshot = self.cart.snapshot();
            live.session.begin_order(payment_intent_id, &snapshot)?
        };

        add_breadcrumb(
            "checkout",
            "Payment confirmed",
            Some(&[("payment_intent_id", payment_intent_id.as_str())]),
        );

        let result = self.gateway.create_order(&order).await;
        let recorded = result.as_ref().map(|o| o.id.clone()).map_err(ToString::to_string);

        let mut live = self.lock();
        match live.session.complete_order(ticket, result) {
            Ok(()) => {
                if let (true, Ok(order_id)) = (live.session.take_cart_clear(), &recorded) {
                    self.clear_cart(order_id);
                }
                let state = live.session.state();
                drop(live);
                if let Ok(order_id) = &recorded {
                    info!(order_id = %order_id, "Order created");
                    add_breadcrumb(
                        "checkout",
                        "Order created",
                        Some(&[("order_id", order_id.as_str())]),
                    );
                }
                Ok(state)
            }
            Err(CheckoutError::SessionDiscarded) => {
                drop(live);
                match recorded {
                    Ok(order_id) => {
                        info!(order_id = %order_id, "Order recorded after checkout was abandoned");
                        self.clear_cart(&order_id);
                    }
                    Err(reason) => report_unrecorded_payment(payment_intent_id.as_str(), &reason),
                }
                Err(CheckoutError::SessionDiscarded)
            }
            Err(err) => {
                drop(live);
                if let CheckoutError::OrderCreationFailed { reason, .. } = &err {
                    report_unrecorded_payment(payment_intent_id.as_str(), reason);
                }
                Err(err)
            }
        }
    }

    /// A failed write leaves the paid lines in the slot; they reappear on
    /// the next start and must be removed by hand.
    fn clear_cart(&self, order_id: &OrderId) {
        if let Err(e) = self.cart.clear_cart() {
            error!(
                order_id = %order_id,
                error = %e,
                "Cart not cleared after order; stored lines may be re-ordered"
            );
        }
    }

    /// Return to the shipping step, discarding any payment intent.
    ///
    /// # Errors
    ///
    /// See [`CheckoutSession::back`].
    pub fn back(&self) -> Result<CheckoutState, CheckoutError> {
        let mut live = self.lock();
        live.session.back()?;
        live.cancel.cancel();
        live.cancel = CancellationToken::new();
        Ok(live.session.state())
    }

    /// Discard the live session and start a fresh one.
    ///
    /// Results of calls still in flight for the old session are ignored.
    pub fn abandon(&self) -> CheckoutState {
        let mut live = self.lock();
        if live.session.in_flight() == Some(PendingCall::CreateOrder) {
            warn!(
                session = %live.session.id(),
                "Checkout abandoned while the order was being recorded"
            );
        }
        live.cancel.cancel();
        *live = Live::fresh();
        live.session.state()
    }
}
