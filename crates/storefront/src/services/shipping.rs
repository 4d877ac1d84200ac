//! Shipping address and shipping method service.
//!
//! The address list is backend-owned; the client reads through a short-TTL
//! cache keyed by the session token, so one shopper's list can never leak
//! into the next login. Every mutation invalidates the cache - the next
//! read refetches.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use fernway_core::AddressId;

use crate::api::{ApiClient, ApiError};
use crate::models::{AddressFields, ShippingAddress, ShippingMethod};

/// Soft client-side cap on saved addresses. Checked before offering "add
/// new"; the backend remains authoritative.
pub const MAX_SAVED_ADDRESSES: usize = 3;

/// Address cache TTL.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Shipping address and method operations.
#[derive(Clone)]
pub struct ShippingService {
    client: ApiClient,
    addresses: Cache<String, Arc<Vec<ShippingAddress>>>,
}

impl ShippingService {
    pub(crate) fn new(client: ApiClient) -> Self {
        let addresses = Cache::builder()
            .max_capacity(4)
            .time_to_live(CACHE_TTL)
            .build();

        Self { client, addresses }
    }

    fn cache_key(&self) -> Option<String> {
        self.client
            .session()
            .token()
            .map(|t| t.expose_secret().to_owned())
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// The shopper's saved addresses, read through the cache.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when the session is invalid, or a
    /// transport error.
    #[instrument(skip(self))]
    pub async fn addresses(&self) -> Result<Vec<ShippingAddress>, ApiError> {
        let Some(key) = self.cache_key() else {
            // No token; let the backend answer 401 so the session-clearing
            // policy in the gateway applies uniformly.
            return self.client.get("/shipping/get").await;
        };

        if let Some(cached) = self.addresses.get(&key).await {
            debug!("address cache hit");
            return Ok(cached.as_ref().clone());
        }

        let fetched: Vec<ShippingAddress> = self.client.get("/shipping/get").await?;
        self.addresses.insert(key, Arc::new(fetched.clone())).await;

        Ok(fetched)
    }

    /// Create a new saved address. Invalidates the cached list.
    ///
    /// # Errors
    ///
    /// Returns a `Backend` error on validation failure, `Unauthorized` on
    /// an invalid session, or a transport error.
    #[instrument(skip_all)]
    pub async fn add_address(&self, fields: &AddressFields) -> Result<ShippingAddress, ApiError> {
        let created: ShippingAddress = self
            .client
            .post_multipart("/shipping/add", address_form(fields))
            .await?;

        self.invalidate().await;
        Ok(created)
    }

    /// Update a saved address. Invalidates the cached list.
    ///
    /// # Errors
    ///
    /// Returns a `Backend` error on validation failure, `Unauthorized` on
    /// an invalid session, or a transport error.
    #[instrument(skip_all, fields(address_id = %id))]
    pub async fn update_address(
        &self,
        id: AddressId,
        fields: &AddressFields,
    ) -> Result<ShippingAddress, ApiError> {
        let updated: ShippingAddress = self
            .client
            .post_multipart(&format!("/shipping/edit/{id}"), address_form(fields))
            .await?;

        self.invalidate().await;
        Ok(updated)
    }

    /// Delete a saved address. Invalidates the cached list.
    ///
    /// # Errors
    ///
    /// Returns a `Backend` error if the address does not exist,
    /// `Unauthorized` on an invalid session, or a transport error.
    #[instrument(skip(self), fields(address_id = %id))]
    pub async fn delete_address(&self, id: AddressId) -> Result<(), ApiError> {
        self.client
            .get_ack(&format!("/shipping/delete/{id}"))
            .await?;

        self.invalidate().await;
        Ok(())
    }

    /// Drop every cached address list. The next read refetches.
    pub async fn invalidate(&self) {
        self.addresses.invalidate_all();
        self.addresses.run_pending_tasks().await;
    }

    // =========================================================================
    // Methods
    // =========================================================================

    /// The selectable shipping methods. Read-only reference data; the
    /// checkout wizard fetches this once per run.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when the session is invalid, or a
    /// transport error.
    #[instrument(skip(self))]
    pub async fn methods(&self) -> Result<Vec<ShippingMethod>, ApiError> {
        self.client.get("/shipping/methods").await
    }
}

fn address_form(fields: &AddressFields) -> reqwest::multipart::Form {
    let method = fields
        .shipping_method
        .map_or_else(String::new, |m| m.to_string());

    reqwest::multipart::Form::new()
        .text("address", fields.address.clone())
        .text("city", fields.city.clone())
        .text("zipcode", fields.zipcode.clone())
        .text("country", fields.country.clone())
        .text("shipping_method", method)
}
