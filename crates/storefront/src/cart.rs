//! In-memory cart, scoped to the lifetime of a browsing session.
//!
//! Lines are unique by `(product, size)`; adding the same pair again merges
//! quantities. Totals and counts are derived from the line list on every
//! read - nothing is cached, so they can never drift.
//!
//! Quantity limits come in two flavors because the legacy storefront had
//! two: the drawer's stepper validated against 99 and rejected anything
//! outside the range, while the context-level update clamped to 3. Which
//! limit is authoritative is a pending product decision, so both live in
//! [`CartLimits`] instead of being unified by guesswork.

use thiserror::Error;

use fernway_core::{Price, ProductId, SizeId};

use crate::models::{Product, ProductSize};

/// Quantity limits for the two mutation paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLimits {
    /// Upper bound for the validating drawer path ([`CartStore::set_quantity`]).
    pub drawer_max: u32,
    /// Upper bound for the clamping update path ([`CartStore::update_quantity`]).
    pub update_max: u32,
}

impl Default for CartLimits {
    fn default() -> Self {
        Self {
            drawer_max: 99,
            update_max: 3,
        }
    }
}

/// Cart mutation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// The requested quantity is outside the drawer's accepted range. The
    /// line is left unchanged.
    #[error("Quantity must be between 1 and {max}")]
    QuantityOutOfRange { max: u32 },
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub size: ProductSize,
    pub price: Price,
    pub original_price: Option<Price>,
    pub quantity: u32,
    pub image: Option<String>,
}

impl CartItem {
    /// Line total: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

/// The in-memory cart.
#[derive(Debug, Default)]
pub struct CartStore {
    items: Vec<CartItem>,
    limits: CartLimits,
    drawer_open: bool,
}

impl CartStore {
    /// An empty cart with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty cart with explicit limits.
    #[must_use]
    pub fn with_limits(limits: CartLimits) -> Self {
        Self {
            items: Vec::new(),
            limits,
            drawer_open: false,
        }
    }

    /// Current lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart drawer should be showing. Adding to the cart opens
    /// it.
    #[must_use]
    pub const fn is_drawer_open(&self) -> bool {
        self.drawer_open
    }

    /// Close the drawer.
    pub fn close_drawer(&mut self) {
        self.drawer_open = false;
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a product size to the cart, merging into an existing
    /// `(product, size)` line if present. Opens the drawer.
    pub fn add(&mut self, product: &Product, size: &ProductSize, quantity: u32) {
        let quantity = quantity.max(1);

        if let Some(line) = self.find_mut(product.id, size.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem {
                id: product.id,
                name: product.name.clone(),
                size: size.clone(),
                price: size.price,
                original_price: None,
                quantity,
                image: product.image.clone(),
            });
        }

        self.drawer_open = true;
    }

    /// Remove the `(product, size)` line, if present.
    pub fn remove(&mut self, product: ProductId, size: SizeId) {
        self.items
            .retain(|line| !(line.id == product && line.size.id == size));
    }

    /// The clamping update path: a requested value below 1 removes the
    /// line; anything else is clamped to `update_max`.
    pub fn update_quantity(&mut self, product: ProductId, size: SizeId, quantity: i64) {
        if quantity < 1 {
            self.remove(product, size);
            return;
        }

        let max = self.limits.update_max;
        if let Some(line) = self.find_mut(product, size) {
            line.quantity = u32::try_from(quantity).unwrap_or(max).min(max);
        }
    }

    /// The validating drawer path: values outside `[1, drawer_max]` leave
    /// the line unchanged and surface a field-level error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::QuantityOutOfRange` without mutating the line.
    pub fn set_quantity(
        &mut self,
        product: ProductId,
        size: SizeId,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity < 1 || quantity > self.limits.drawer_max {
            return Err(CartError::QuantityOutOfRange {
                max: self.limits.drawer_max,
            });
        }

        if let Some(line) = self.find_mut(product, size) {
            line.quantity = quantity;
        }
        Ok(())
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    // =========================================================================
    // Derived values
    // =========================================================================

    /// Sum of `price * quantity` over all lines. Recomputed on every call.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Total number of units across all lines. Recomputed on every call.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    fn find_mut(&mut self, product: ProductId, size: SizeId) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|line| line.id == product && line.size.id == size)
    }
}
