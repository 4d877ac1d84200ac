//! Domain services: one thin async wrapper per backend concern.
//!
//! Every operation maps 1:1 to a backend endpoint and returns
//! `Result<_, ApiError>` - a single failure taxonomy across the client.
//! Services hold no business logic beyond field mapping and the side
//! effects the storefront depends on (login writes the session, profile
//! edits refresh the cached snapshot, address mutations invalidate the
//! cached list).

pub mod auth;
pub mod orders;
pub mod payments;
pub mod shipping;

pub use auth::AuthService;
pub use orders::OrderService;
pub use payments::PaymentService;
pub use shipping::{MAX_SAVED_ADDRESSES, ShippingService};

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::StorefrontConfig;
use crate::session::SessionStore;

/// The service bundle shared across the client.
///
/// Cheaply cloneable via `Arc`; all services share one configured HTTP
/// client and one session store.
#[derive(Clone)]
pub struct Services {
    inner: Arc<ServicesInner>,
}

struct ServicesInner {
    session: SessionStore,
    auth: AuthService,
    shipping: ShippingService,
    orders: OrderService,
    payments: PaymentService,
}

impl Services {
    /// Wire up all services against the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &StorefrontConfig, session: SessionStore) -> Result<Self, ApiError> {
        let client = ApiClient::new(config, session.clone())?;

        Ok(Self {
            inner: Arc::new(ServicesInner {
                session: session.clone(),
                auth: AuthService::new(client.clone()),
                shipping: ShippingService::new(client.clone()),
                orders: OrderService::new(client.clone()),
                payments: PaymentService::new(client),
            }),
        })
    }

    /// The shared session store.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// Authentication and profile operations.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Shipping address and method operations.
    #[must_use]
    pub fn shipping(&self) -> &ShippingService {
        &self.inner.shipping
    }

    /// Order and product operations.
    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    /// Payment history operations.
    #[must_use]
    pub fn payments(&self) -> &PaymentService {
        &self.inner.payments
    }
}
