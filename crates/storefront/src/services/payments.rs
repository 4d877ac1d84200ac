//! Payment history service.

use tracing::instrument;

use fernway_core::PaymentId;

use crate::api::{ApiClient, ApiError};
use crate::models::Payment;

/// Payment history operations.
#[derive(Clone)]
pub struct PaymentService {
    client: ApiClient,
}

impl PaymentService {
    pub(crate) const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// The shopper's payment history.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` on an invalid session, or a
    /// transport error.
    #[instrument(skip(self))]
    pub async fn payments(&self) -> Result<Vec<Payment>, ApiError> {
        self.client.get("/payments/get").await
    }

    /// Check the settlement state of one payment.
    ///
    /// # Errors
    ///
    /// Returns a `Backend` error if the payment does not exist,
    /// `Unauthorized` on an invalid session, or a transport error.
    #[instrument(skip(self), fields(payment_id = %id))]
    pub async fn payment_status(&self, id: PaymentId) -> Result<Payment, ApiError> {
        self.client.get(&format!("/payment/status/{id}")).await
    }
}
