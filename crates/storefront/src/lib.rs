//! Fernway Storefront client library.
//!
//! Talks to the Fernway REST backend on behalf of a single shopper:
//! authentication, profile, shipping addresses, shipping methods, order
//! placement, and order/payment history. Also owns the two pieces of
//! client-side state the storefront keeps between calls - the expiring
//! session store and the in-memory cart - plus the multi-step checkout
//! wizard that ties them together.
//!
//! # Layers
//!
//! - [`session`] - persistent, expiring session records (token, user
//!   snapshot, order draft) with change notifications
//! - [`api`] - the configured HTTP client and the backend's response
//!   envelope
//! - [`services`] - one thin async service per backend concern
//! - [`cart`] - in-memory cart with derived totals
//! - [`checkout`] - the step-gated checkout wizard
//!
//! # Example
//!
//! ```rust,ignore
//! use fernway_storefront::config::StorefrontConfig;
//! use fernway_storefront::session::SessionStore;
//! use fernway_storefront::services::Services;
//!
//! let config = StorefrontConfig::from_env()?;
//! let session = SessionStore::open(&config)?;
//! let services = Services::new(&config, session.clone())?;
//!
//! services.auth().login("shopper@example.com", "hunter2").await?;
//! let addresses = services.shipping().addresses().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod models;
pub mod services;
pub mod session;
