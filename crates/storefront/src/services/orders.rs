//! Order and product service.
//!
//! Order creation is deliberately single-shot: no retry and no idempotency
//! key, so a double submit would create two orders. The checkout wizard's
//! in-flight flag is the only client-side guard.

use tracing::instrument;

use fernway_core::{OrderId, ProductId};

use crate::api::{ApiClient, ApiError};
use crate::models::{Order, OrderRequest, Product};

/// Order and product operations.
#[derive(Clone)]
pub struct OrderService {
    client: ApiClient,
}

impl OrderService {
    pub(crate) const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Place an order. Bearer auth required.
    ///
    /// # Errors
    ///
    /// Returns a `Backend` error when the order is rejected (stock,
    /// validation), `Unauthorized` on an invalid session, or a transport
    /// error.
    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn create_order(&self, request: &OrderRequest) -> Result<Order, ApiError> {
        let form = reqwest::multipart::Form::new()
            .text("productID", request.product_id.to_string())
            .text("quantity", request.quantity.to_string())
            .text("size_index", request.size_index.to_string())
            .text("shipping_address", request.shipping_address.to_string())
            .text("shipping_method", request.shipping_method.to_string());

        self.client.post_multipart("/freshorder/create", form).await
    }

    /// Fetch a single order.
    ///
    /// # Errors
    ///
    /// Returns a `Backend` error if the order does not exist,
    /// `Unauthorized` on an invalid session, or a transport error.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order(&self, id: OrderId) -> Result<Order, ApiError> {
        self.client.get(&format!("/orders/{id}")).await
    }

    /// Fetch a product with its sizes and stock.
    ///
    /// # Errors
    ///
    /// Returns a `Backend` error if the product does not exist, or a
    /// transport error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.client.get(&format!("/product/{id}")).await
    }
}
