use serde::{Deserialize, Serialize};

/// A single product on a restaurant's menu
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
}

impl CatalogProduct {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            price,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Read-only product list for one restaurant
///
/// Enumeration order is the order the products were declared in. Every
/// "first match" lookup and every ranking tie-break relies on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Catalog {
    products: Vec<CatalogProduct>,
}

impl Catalog {
    pub fn new(products: Vec<CatalogProduct>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[CatalogProduct] {
        &self.products
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn get(&self, product_id: &str) -> Option<&CatalogProduct> {
        self.products.iter().find(|p| p.id == product_id)
    }

    /// Declaration index of a product, used as the final ranking tie-break
    pub fn position(&self, product_id: &str) -> Option<usize> {
        self.products.iter().position(|p| p.id == product_id)
    }

    /// Products grouped by category, categories in first-seen order
    pub fn by_category(&self) -> Vec<(&str, Vec<&CatalogProduct>)> {
        let mut groups: Vec<(&str, Vec<&CatalogProduct>)> = Vec::new();

        for product in &self.products {
            match groups
                .iter_mut()
                .find(|(category, _)| *category == product.category.as_str())
            {
                Some((_, members)) => members.push(product),
                None => groups.push((product.category.as_str(), vec![product])),
            }
        }

        groups
    }
}
