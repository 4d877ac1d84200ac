//! Catalog types: products and their purchasable sizes.

use serde::{Deserialize, Serialize};

use fernway_core::{Price, ProductId, SizeId};

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Units available across all sizes. Quantity selections clamp to this.
    pub stock: u32,
    pub sizes: Vec<ProductSize>,
}

impl Product {
    /// Look up a size by its position in the size list.
    ///
    /// The backend addresses sizes by index (`size_index`) rather than by id
    /// on order creation, so both the index and the size are needed together.
    #[must_use]
    pub fn size_at(&self, index: usize) -> Option<&ProductSize> {
        self.sizes.get(index)
    }
}

/// One purchasable size of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSize {
    pub id: SizeId,
    pub name: String,
    /// Net weight in grams.
    pub weight: u32,
    pub price: Price,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new(1),
            name: "High Garden Oolong".to_string(),
            description: String::new(),
            image: None,
            stock: 10,
            sizes: vec![
                ProductSize {
                    id: SizeId::new(1),
                    name: "50g".to_string(),
                    weight: 50,
                    price: Price::from_cents(1400),
                },
                ProductSize {
                    id: SizeId::new(2),
                    name: "100g".to_string(),
                    weight: 100,
                    price: Price::from_cents(2600),
                },
            ],
        }
    }

    #[test]
    fn test_size_at() {
        let p = product();
        assert_eq!(p.size_at(1).unwrap().weight, 100);
        assert!(p.size_at(2).is_none());
    }
}
