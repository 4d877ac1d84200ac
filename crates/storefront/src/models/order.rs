//! Order types: the client-side draft, the creation request, and history
//! entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fernway_core::{
    AddressId, OrderId, OrderStatus, PaymentId, PaymentStatus, Price, ProductId, ShippingMethodId,
};

use super::catalog::{Product, ProductSize};

/// The shopper's not-yet-submitted selection, persisted in the session
/// store between the product page and checkout.
///
/// Invariants, enforced at every mutation:
/// - `quantity` stays within `[1, stock]`
/// - `total_price` is always `size.price * quantity`; it is never adjusted
///   independently of its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub product_id: ProductId,
    pub product_name: String,
    /// Position of `size` in the product's size list; the order-creation
    /// endpoint addresses sizes by index.
    pub size_index: usize,
    pub size: ProductSize,
    pub quantity: u32,
    pub total_price: Price,
}

impl OrderDraft {
    /// Create a draft for a product size. Quantity is clamped to the
    /// product's stock.
    ///
    /// Returns `None` if `size_index` is out of bounds.
    #[must_use]
    pub fn new(product: &Product, size_index: usize, quantity: u32) -> Option<Self> {
        let size = product.size_at(size_index)?.clone();
        let quantity = clamp_to_stock(quantity, product.stock);
        Some(Self {
            product_id: product.id,
            product_name: product.name.clone(),
            size_index,
            total_price: size.price * quantity,
            size,
            quantity,
        })
    }

    /// Change the quantity, clamping to `[1, stock]` and recomputing the
    /// total.
    pub fn set_quantity(&mut self, quantity: u32, stock: u32) {
        self.quantity = clamp_to_stock(quantity, stock);
        self.total_price = self.size.price * self.quantity;
    }

    /// Switch to a different size of the same product, recomputing the
    /// total. Returns `false` (leaving the draft unchanged) if the index is
    /// out of bounds.
    pub fn set_size(&mut self, product: &Product, size_index: usize) -> bool {
        let Some(size) = product.size_at(size_index) else {
            return false;
        };
        self.size_index = size_index;
        self.size = size.clone();
        self.total_price = self.size.price * self.quantity;
        true
    }
}

fn clamp_to_stock(quantity: u32, stock: u32) -> u32 {
    quantity.clamp(1, stock.max(1))
}

/// Payload for `POST /freshorder/create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    pub size_index: usize,
    pub shipping_address: AddressId,
    pub shipping_method: ShippingMethodId,
}

/// A placed order, as returned by `GET /orders/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "ID")]
    pub id: OrderId,
    pub product_name: String,
    pub quantity: u32,
    pub total: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// A payment history entry, as returned by `GET /payments/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "ID")]
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Price,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}
