//! Order endpoints.

use mambini_core::{OrderId, OrderStatus};
use reqwest::Method;
use tracing::instrument;

use super::conversions::{convert_order, convert_orders, new_order_to_request};
use super::types::{NewOrder, Order};
use super::wire::{OrderDto, OrderStatusUpdateRequest};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Record an order for the authenticated user.
    ///
    /// The API re-validates stock and prices, so a stale cart surfaces here
    /// as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the order or the request fails.
    #[instrument(skip(self, order), fields(items = order.items.len()))]
    pub async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        let body = new_order_to_request(order);
        let response: OrderDto = self.send(Method::POST, self.url("/orders/")?, &body).await?;
        let order = convert_order(response)?;

        tracing::info!(order_id = %order.id, total = %order.total_amount, "Order created");
        Ok(order)
    }

    /// Orders placed by the authenticated user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a record is malformed.
    #[instrument(skip(self))]
    pub async fn list_my_orders(&self) -> Result<Vec<Order>, ApiError> {
        let response: Vec<OrderDto> = self.get(self.url("/orders/")?).await?;
        convert_orders(response)
    }

    /// Every order in the shop (admin only).
    ///
    /// # Errors
    ///
    /// Returns an error if the token lacks admin rights or the request fails.
    #[instrument(skip(self))]
    pub async fn list_all_orders(&self) -> Result<Vec<Order>, ApiError> {
        let response: Vec<OrderDto> = self.get(self.url("/orders/all")?).await?;
        convert_orders(response)
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        let url = self.item_url("/orders/", id.as_str(), None)?;
        let response: OrderDto = self.get(url).await?;
        convert_order(response)
    }

    /// Move an order to a new status (admin only).
    ///
    /// # Errors
    ///
    /// Returns an error if the token lacks admin rights, the order is not
    /// found, or the request fails.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let body = OrderStatusUpdateRequest {
            status: status.as_str().to_string(),
        };
        let url = self.item_url("/orders/", id.as_str(), Some("status"))?;
        let response: OrderDto = self.send(Method::PUT, url, &body).await?;
        convert_order(response)
    }
}
