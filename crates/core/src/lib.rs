//! Fernway Core - Shared types library.
//!
//! This crate provides common types used across all Fernway components:
//! - `storefront` - Client library for the Fernway REST backend
//! - `cli` - Command-line storefront frontend
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! persistence. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
