//! Payment intent endpoints.

use mambini_core::{OrderId, PaymentIntentId, Price};
use reqwest::Method;
use tracing::instrument;

use super::conversions::{convert_payment_intent, convert_payment_intent_state};
use super::types::{PaymentIntent, PaymentIntentState};
use super::wire::{PaymentIntentRequest, PaymentIntentResponse, PaymentIntentStatusResponse};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Create a payment intent for `amount`.
    ///
    /// The returned client secret is what the card processor confirms
    /// against.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the amount (it enforces a minimum
    /// of 0.50) or the request fails.
    #[instrument(skip(self), fields(amount = %amount))]
    pub async fn create_payment_intent(
        &self,
        amount: Price,
        order_id: Option<&OrderId>,
    ) -> Result<PaymentIntent, ApiError> {
        let body = PaymentIntentRequest {
            amount: amount.amount,
            currency: amount.currency_code.code().to_string(),
            order_id: order_id.map(ToString::to_string),
        };

        let response: PaymentIntentResponse = self
            .send(Method::POST, self.url("/payment/create-intent")?, &body)
            .await?;
        let intent = convert_payment_intent(response)?;

        tracing::info!(payment_intent_id = %intent.id, "Payment intent created");
        Ok(intent)
    }

    /// Look up the processor's view of a payment intent.
    ///
    /// # Errors
    ///
    /// Returns an error if the intent is unknown, belongs to another user, or
    /// the request fails.
    #[instrument(skip(self), fields(payment_intent_id = %id))]
    pub async fn get_payment_intent(
        &self,
        id: &PaymentIntentId,
    ) -> Result<PaymentIntentState, ApiError> {
        let url = self.item_url("/payment/intent/", id.as_str(), None)?;
        let response: PaymentIntentStatusResponse = self.get(url).await?;
        convert_payment_intent_state(response)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mambini_core::{CurrencyCode, PaymentIntentStatus};
    use rust_decimal::Decimal;
    use secrecy::ExposeSecret;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::ApiConfig;

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&ApiConfig::new(&server.uri()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_create_payment_intent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payment/create-intent"))
            .and(body_json(serde_json::json!({"amount": 30.0, "currency": "eur"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "client_secret": "pi_1_secret_x",
                "payment_intent_id": "pi_1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let intent = client_for(&server)
            .create_payment_intent(Price::new(Decimal::new(3000, 2), CurrencyCode::EUR), None)
            .await
            .unwrap();
        assert_eq!(intent.id.as_str(), "pi_1");
        assert_eq!(intent.client_secret.expose_secret(), "pi_1_secret_x");
    }

    #[tokio::test]
    async fn test_create_payment_intent_missing_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payment/create-intent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"payment_intent_id": "pi_1"})),
            )
            .mount(&server)
            .await;

        let result = client_for(&server)
            .create_payment_intent(Price::new(Decimal::ONE, CurrencyCode::EUR), None)
            .await;
        assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_get_payment_intent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payment/intent/pi_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pi_1",
                "status": "requires_payment_method",
                "amount": 30.0,
                "currency": "eur"
            })))
            .mount(&server)
            .await;

        let state = client_for(&server)
            .get_payment_intent(&PaymentIntentId::new("pi_1"))
            .await
            .unwrap();
        assert_eq!(state.status, PaymentIntentStatus::RequiresPaymentMethod);
        assert_eq!(state.amount.amount, Decimal::new(30, 0));
    }
}
