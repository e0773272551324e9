use serde::{Deserialize, Serialize};

use super::CatalogProduct;

/// One product-quantity pair in a customer's cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    pub product_id: String,
    pub product: CatalogProduct,
    pub quantity: u32,
    pub category: String,
}

impl CartLine {
    pub fn new(product: CatalogProduct, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            category: product.category.clone(),
            product,
            quantity,
        }
    }

    pub fn name(&self) -> &str {
        &self.product.name
    }
}

/// Returns true when `product_id` already has a line in the cart
pub fn contains_product(lines: &[CartLine], product_id: &str) -> bool {
    lines.iter().any(|line| line.product_id == product_id)
}
