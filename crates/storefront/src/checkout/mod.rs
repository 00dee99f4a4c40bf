//! Checkout flow: shipping, payment, order.
//!
//! # Architecture
//!
//! - [`CheckoutSession`] is a synchronous state machine; each transition
//!   either applies fully or leaves the session untouched
//! - [`Checkout`] runs the network calls between transitions, racing the
//!   payment intent request against the session's cancellation token
//! - Results are matched to the session by ticket, so a response arriving
//!   after `back` or `abandon` is dropped as stale
//!
//! ```text
//! Shipping --submit_shipping--> Payment --payment_succeeded--> Completed
//!    ^                            |  \
//!    +-----------back-------------+   +--order rejected--> Failed
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let checkout = Checkout::new(client, cart.clone(), CurrencyCode::EUR);
//! let state = checkout.submit_shipping(shipping).await?;
//! // hand state.client_secret to the card processor, then:
//! let state = checkout.confirm_payment(processor_result.into()).await?;
//! ```

mod error;
mod orchestrator;
mod payment;
mod session;

pub use error::CheckoutError;
pub use orchestrator::Checkout;
pub use payment::{PaymentOutcome, ProcessorError, ProcessorIntent, ProcessorResult};
pub use session::{CheckoutSession, CheckoutState, CheckoutStep, PendingCall, Ticket};
