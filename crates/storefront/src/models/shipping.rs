//! Shipping address and shipping method types.
//!
//! Both lists are backend-owned; the client treats them as refreshable
//! caches. Field names follow the backend's JSON (`ID`, `zipcode`,
//! `shipping_method`, `is_default`).

use serde::{Deserialize, Serialize};

use fernway_core::{AddressId, Price, ShippingMethodId};

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(rename = "ID")]
    pub id: AddressId,
    pub address: String,
    pub city: String,
    pub zipcode: String,
    #[serde(default)]
    pub country: String,
    /// Preferred method id recorded alongside the address by the backend.
    #[serde(default)]
    pub shipping_method: Option<ShippingMethodId>,
    #[serde(default)]
    pub is_default: bool,
}

/// Fields submitted when creating or editing an address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFields {
    pub address: String,
    pub city: String,
    pub zipcode: String,
    pub country: String,
    pub shipping_method: Option<ShippingMethodId>,
}

impl From<&ShippingAddress> for AddressFields {
    fn from(saved: &ShippingAddress) -> Self {
        Self {
            address: saved.address.clone(),
            city: saved.city.clone(),
            zipcode: saved.zipcode.clone(),
            country: saved.country.clone(),
            shipping_method: saved.shipping_method,
        }
    }
}

/// A selectable shipping method. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMethod {
    #[serde(rename = "ID")]
    pub id: ShippingMethodId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
}
